#[cfg(feature = "debug")]
#[macro_export]
macro_rules! debugln {
    ($($rest:tt)*) => {
        std::println!($($rest)*)
    }
}

#[cfg(not(feature = "debug"))]
#[macro_export]
macro_rules! debugln {
    ($($rest:tt)*) => {
        ()
    };
}

#[macro_export]
macro_rules! warnln {
    ($($rest:tt)*) => {
        std::eprintln!($($rest)*)
    }
}

/// Panics with a formatted message, used at the points where continuing
/// execution would silently corrupt emulator state (illegal opcode
/// dispatch, out of range bank selection, etc).
#[macro_export]
macro_rules! panic_gb {
    ($($rest:tt)*) => {
        panic!($($rest)*)
    }
}

#[cfg(feature = "pedantic")]
#[macro_export]
macro_rules! assert_pedantic_gb {
    ($cond:expr, $($rest:tt)*) => {
        assert!($cond, $($rest)*)
    }
}

#[cfg(not(feature = "pedantic"))]
#[macro_export]
macro_rules! assert_pedantic_gb {
    ($cond:expr, $($rest:tt)*) => {
        ()
    }
}
