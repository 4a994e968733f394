use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let matches = match trimg_cli::parse_args(std::env::args_os()) {
        Ok(matches) => matches,
        Err(code) => return code,
    };
    trimg_cli::init_tracing(matches.get_flag("verbose"));

    let mut stdout = std::io::stdout().lock();
    match trimg_cli::run(&matches, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
