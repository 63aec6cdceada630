//! CLI entry point for the recitation mirror.

mod app;
mod app_config;
mod cli;
mod output;

/// How the process ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    Success,
    Failure,
    Interrupted,
}

impl ProcessExit {
    fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::Failure => 1,
            Self::Interrupted => 130,
        }
    }
}

#[tokio::main]
async fn main() {
    let exit = match app::runtime::run_mirror().await {
        Ok(exit) => exit,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ProcessExit::Failure
        }
    };
    std::process::exit(exit.code());
}

#[cfg(test)]
mod tests {
    use super::ProcessExit;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ProcessExit::Success.code(), 0);
        assert_eq!(ProcessExit::Failure.code(), 1);
        assert_eq!(ProcessExit::Interrupted.code(), 130);
    }
}
