//! Rule-driven rewriter for client PIRA report workbooks.
//!
//! A PIRA is a client-specific financial/operational report workbook. The
//! processor detects the workbook's client layout from its sheet names,
//! loads the client's JSON rule document and replays the declarative
//! cell/range operations against the workbook in place.

pub mod addr;
pub mod cli;
pub mod detector;
pub mod engine;
pub mod processor;
pub mod rules;
pub mod xlsx;
