use crate::demo::{run_demo, run_questions, run_score, DemoArgs, QuestionsArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use decision_engine::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Decision Engine",
    about = "Run guided decision questionnaires over HTTP or from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the question catalog
    Questions(QuestionsArgs),
    /// Score a CSV answer sheet without starting the server
    Score(ScoreArgs),
    /// Walk through a scripted decision session end to end
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Questions(args) => run_questions(args),
        Command::Score(args) => run_score(args),
        Command::Demo(args) => run_demo(args),
    }
}
