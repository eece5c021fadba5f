mod common;
mod matching;
