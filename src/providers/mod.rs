pub mod belvo;

pub use belvo::BelvoProvider;
