use std::sync::atomic::{AtomicU8, Ordering};

static VERBOSITY: AtomicU8 = AtomicU8::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet = 0,
    Basic = 1,
    Verbose = 2,
}

impl Verbosity {
    /// `-V` supersedes `-v`.
    pub fn from_flags(basic: bool, verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else if basic {
            Verbosity::Basic
        } else {
            Verbosity::Quiet
        }
    }
}

pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

pub fn verbosity() -> Verbosity {
    match VERBOSITY.load(Ordering::Relaxed) {
        0 => Verbosity::Quiet,
        1 => Verbosity::Basic,
        _ => Verbosity::Verbose,
    }
}

pub fn is_info_enabled() -> bool {
    verbosity() >= Verbosity::Basic
}

pub fn is_debug_enabled() -> bool {
    verbosity() >= Verbosity::Verbose
}

#[macro_export]
macro_rules! info_println {
    ($($arg:tt)*) => {
        if $crate::debug::is_info_enabled() {
            println!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! debug_println {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            println!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! debug_eprintln {
    ($($arg:tt)*) => {
        if $crate::debug::is_debug_enabled() {
            eprintln!($($arg)*);
        }
    };
}
