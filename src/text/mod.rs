//! Text preprocessing: normalization, rewrite rules, phonotactics

pub mod normalizer;
pub mod phonotactics;
pub mod rules;

pub use rules::RewriteRules;
