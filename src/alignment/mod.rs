pub mod matching;
pub mod normalization;
pub mod realign;
pub mod report;
