mod common;
mod engine;
mod properties;
