// Copyright 2025 Muvon Un Limited
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Directory utilities for cross-platform data directory management

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the system-wide data directory for gemchat
///
/// This function returns the appropriate data directory based on the OS:
/// - macOS: ~/.local/share/gemchat
/// - Linux: ~/.local/share/gemchat (following XDG Base Directory specification)
/// - Windows: %LOCALAPPDATA%/gemchat
pub fn get_gemchat_data_dir() -> Result<PathBuf> {
	let data_dir = match dirs::home_dir() {
		Some(home) => {
			#[cfg(target_os = "windows")]
			let path = {
				// On Windows, use %LOCALAPPDATA%/gemchat
				match dirs::data_local_dir() {
					Some(dir) => dir.join("gemchat"),
					None => home.join("AppData").join("Local").join("gemchat"),
				}
			};

			#[cfg(not(target_os = "windows"))]
			let path = home.join(".local").join("share").join("gemchat");

			path
		}
		None => {
			return Err(anyhow::anyhow!("Unable to determine home directory"));
		}
	};

	// Ensure the directory exists
	if !data_dir.exists() {
		fs::create_dir_all(&data_dir).context(format!(
			"Failed to create gemchat data directory: {}",
			data_dir.display()
		))?;
	}

	Ok(data_dir)
}

/// Get the default configuration file path
pub fn get_config_file_path() -> Result<PathBuf> {
	let data_dir = get_gemchat_data_dir()?;
	Ok(data_dir.join("config.toml"))
}
