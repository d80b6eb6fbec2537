mod model;

pub use model::Dataset;
