//! CLI Exit Code Registry
//!
//! Single source of truth for all `tracecheck` exit codes. Scripts rely on
//! them.
//!
//! | Code | Meaning                                             |
//! |------|-----------------------------------------------------|
//! | 0    | Success; sessions fully matched                     |
//! | 1    | Discrepancies found (like `diff(1)`)                |
//! | 2    | CLI usage error (bad args, no metric file given)    |
//! | 3    | Invalid config (TOML or validation)                 |
//! | 4    | Input error (missing files, columns, bad cells)     |
//! | 5    | Cannot write the report                             |

/// Success - command completed; for `run`, every observation matched.
pub const EXIT_SUCCESS: u8 = 0;

/// At least one observation lacks a counterpart.
pub const EXIT_MISMATCH: u8 = 1;

/// Usage error - bad arguments, missing required input.
pub const EXIT_USAGE: u8 = 2;

/// Config file unreadable, unparseable, or invalid.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// A normalizer failed: directory, file name, column, or cell problem.
pub const EXIT_INPUT: u8 = 4;

/// Report destination could not be created or written.
pub const EXIT_OUTPUT: u8 = 5;
