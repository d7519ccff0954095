fn main() {
    match auditpipe::cli::run() {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            auditpipe::ui::eprintln_error(&err);
            std::process::exit(auditpipe::exit::exit_code(&err));
        }
    }
}
