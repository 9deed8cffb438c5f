use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[clap(author, version)]
#[clap(name = "Chess Corpus Client")]
#[clap(about = "Builds move-statistics corpora from PGN files and scores their child positions", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    CreateDatabase(CreateDatabaseCommand),
    ScoreChildren(ScoreChildrenCommand),
}

#[derive(Args)]
#[clap(about = "Aggregates PGN games into board/move counts and writes the split outputs", long_about = None)]
pub struct CreateDatabaseCommand {
    #[clap(short, long, default_value_t = String::from("client.conf"))]
    pub config: String,
}

#[derive(Args)]
#[clap(about = "Scores every child of the boards in a corpus file", long_about = None)]
pub struct ScoreChildrenCommand {
    #[clap(short, long, default_value_t = String::from("client.conf"))]
    pub config: String,
}
