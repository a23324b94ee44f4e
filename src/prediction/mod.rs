// Prediction of surrounding traffic

pub mod neighbor_predictor;

pub use neighbor_predictor::*;
