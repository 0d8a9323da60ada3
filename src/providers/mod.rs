pub mod travis;
