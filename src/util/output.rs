#![allow(clippy::print_stdout)]

/* Everything else goes to stderr through the logger, stdout is reserved for
 * output a caller might want to capture (the `config` action). */
pub fn print_output(printed_output: &str) {
    println!("{}", printed_output);
}

#[macro_export]
macro_rules! outln {
    ( $fmt:expr $(, $args:expr)*) => {
        $crate::util::print_output(&format!($fmt $(, $args)*))
    };
}
