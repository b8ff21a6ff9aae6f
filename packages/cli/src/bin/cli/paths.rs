use colored::*;
use workbench_core::{check_path, WorkbenchConfig};

/// Print the normalized form of each path, or why it was rejected
pub fn validate_paths(config: &WorkbenchConfig, paths: &[String]) {
    for path in paths {
        match check_path(path, &config.project_root) {
            Ok(normalized) => println!("{} {} {}", path, "->".dimmed(), normalized.green()),
            Err(reason) => println!(
                "{} {} {} ({})",
                path,
                "->".dimmed(),
                "rejected".red(),
                reason
            ),
        }
    }
}
