pub mod model;
pub mod shared;
pub mod table;
pub mod tag;
pub mod tagger;
pub mod trainer;
pub mod viterbi;
