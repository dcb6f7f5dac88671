//! CLI Exit Code Registry
//!
//! This is the single source of truth for all `ttrack` exit codes.
//! Exit codes are part of the shell contract: schedulers and scripts rely on them.
//!
//! | Code | Meaning                                                  |
//! |------|----------------------------------------------------------|
//! | 0    | Success (warnings allowed)                               |
//! | 1    | Validation found at least one ERROR-level issue          |
//! | 2    | Usage error (bad arguments, unreadable config file)      |
//! | 3    | Input error (missing files, missing columns, bad values) |
//! | 4    | Output could not be written                              |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above

/// Success - command completed; warnings may have been reported.
pub const EXIT_SUCCESS: u8 = 0;

/// Validation produced ERROR-level issues. Outputs were not computed.
pub const EXIT_VALIDATION: u8 = 1;

/// Usage error - bad arguments or an unreadable `--config` file.
/// Also what clap exits with on argument errors.
pub const EXIT_USAGE: u8 = 2;

/// Input tables are missing, unreadable or do not have the expected shape.
pub const EXIT_INPUT: u8 = 3;

/// The output directory, workbook or issue CSV could not be written.
pub const EXIT_OUTPUT: u8 = 4;
