pub mod context;
pub mod reconciler;

pub use context::SidebarContext;
pub use reconciler::SessionListReconciler;
