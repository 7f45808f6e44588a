mod anchor_words;
mod boxes;
mod drafts;
mod rhymes;
mod sessions;
