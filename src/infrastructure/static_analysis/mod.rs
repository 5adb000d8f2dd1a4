//! Static analysis adapters.

pub mod lint;
pub mod python;
pub mod syntax;

pub use lint::LintTool;
pub use python::PythonStaticAnalyzer;
