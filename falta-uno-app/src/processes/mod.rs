pub mod match_lifecycle_runner;
