mod exports;
mod progress;
mod styling;

pub use exports::{BuildSink, CsvExporter};
pub use progress::DrainProgress;
pub use styling::{cyan, dim, magenta_bold};

/// Prints the travis-dump banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("📦 travis-dump"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Travis CI build export")
    );
}
