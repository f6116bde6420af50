//! UI utilities for the client.

use std::io::Write;

/// Prompt shown while waiting for input
pub fn prompt(username: &str) -> String {
    format!("{}> ", username)
}

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt(username: &str) {
    print!("{}", prompt(username));
    std::io::stdout().flush().ok();
}
