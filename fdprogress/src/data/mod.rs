/// `log::debug!` gated on the caller's debug flag.
macro_rules! trace {
    ($debug:expr, $($arg:tt)+) => {
        if $debug {
            log::debug!($($arg)+);
        }
    };
}

pub mod collector;
pub mod fd;
pub mod process;
pub mod sample;
