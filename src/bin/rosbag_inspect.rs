//! Command-line inspector for bag files.
//!
//! Opens a bag with the raw-bytes schema compiler (no real ROS message
//! decoding) and, per the requested flags, prints its topic table, its
//! chunk table, or per-message payload lengths for one topic.

use std::process;
use std::sync::Arc;

use clap::Parser;

use rosbag::{Bag, RawBytesCompiler};

/// Inspect a ROS bag file's topics, chunks, and messages.
#[derive(Parser)]
#[command(name = "rosbag-inspect")]
#[command(about = "Inspect the structure of a ROS bag file", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to the bag file.
    path: String,

    /// Print the topic table.
    #[arg(long)]
    topics: bool,

    /// Print the chunk-info table (v1.3 bags only).
    #[arg(long)]
    chunks: bool,

    /// Print payload lengths for every message on this topic.
    #[arg(long, value_name = "TOPIC")]
    messages: Option<String>,
}

fn run(cli: Cli) -> rosbag::Result<()> {
    let mut bag = Bag::open_path(&cli.path, Arc::new(RawBytesCompiler))?;

    if cli.topics {
        println!("{:<32} {:<40} {:<32} count", "topic", "datatype", "md5sum");
        let mut topics: Vec<_> = bag.topic_infos().values().cloned().collect();
        topics.sort_by(|a, b| a.topic.cmp(&b.topic));
        for info in &topics {
            let md5 = base16ct::lower::encode_string(&info.md5sum);
            let count = bag.topic_index_len(&info.topic);
            println!("{:<32} {:<40} {:<32} {count}", info.topic, info.datatype, md5);
        }
    }

    if cli.chunks {
        println!();
        println!("{:<12} {:<20} {:<20} topics", "chunk_pos", "start_time", "end_time");
        for chunk in bag.chunk_infos() {
            println!(
                "{:<12} {:<20} {:<20} {:?}",
                chunk.chunk_pos, chunk.start_time, chunk.end_time, chunk.topic_counts
            );
        }
    }

    if let Some(topic) = cli.messages {
        for index in 0..bag.topic_index_len(&topic) {
            let message = bag.read_message(&topic, index)?;
            let rosbag::Message::Raw(bytes) = message;
            println!("{topic}[{index}]: {} bytes", bytes.len());
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{e}");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
