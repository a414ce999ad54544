use std::{env, fs, path::Path};
use util::config;

mod runner;

/// `migration [up|fresh|clean|down [N]]`
#[tokio::main]
async fn main() {
    let db_path = config::database_path();
    let url = if db_path.starts_with("sqlite:") {
        db_path.clone()
    } else {
        format!("sqlite://{}?mode=rwc", db_path)
    };
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("clean") => {
            remove_db_file(&db_path);
        }
        Some("fresh") => {
            remove_db_file(&db_path);
            create_db_dir(&db_path);
            runner::run_all_migrations(&url).await;
        }
        Some("down") => {
            let steps = args
                .get(2)
                .and_then(|n| n.parse::<usize>().ok())
                .unwrap_or(1);
            runner::revert_migrations(&url, steps).await;
        }
        Some("up") | None => {
            create_db_dir(&db_path);
            runner::run_all_migrations(&url).await;
        }
        Some(other) => {
            eprintln!("Unknown command '{other}'. Expected one of: up, fresh, clean, down [N]");
            std::process::exit(2);
        }
    }
}

fn remove_db_file(path: &str) {
    let db_path = Path::new(path);
    if db_path.exists() {
        fs::remove_file(db_path).expect("Failed to delete DB file");
        println!("Deleted DB: {}", db_path.display());
    } else {
        println!("DB file does not exist: {}", db_path.display());
    }
}

fn create_db_dir(path: &str) {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).expect("Failed to create DB directory");
        }
    }
}
