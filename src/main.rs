fn main() {
    if let Err(err) = pindefs::run() {
        use colored::Colorize;
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}
