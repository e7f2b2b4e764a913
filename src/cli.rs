use clap::Parser;
use std::path::PathBuf;

pub const HELP_KEYS: &str = "\
Key Bindings:
  Esc / q          : Quit
  Up / Down        : Move selection
  Right            : Expand directory
  Enter            : Expand directory / open file
  Left             : Collapse directory
  Space / n        : Next image in category
  Backspace / p    : Previous image in category
  r / F5           : Refresh
  o                : Open selected file externally
  l                : Launch companion app
  Tab              : Switch tree / category view
  ?                : Toggle help overlay
  Wheel            : Scroll pane under cursor
";

#[derive(Parser)]
#[command(name = "ibrowse", about = "Browse a directory tree of images and text", after_help = HELP_KEYS)]
pub struct Cli {
    /// Root directory of the tree view
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Start in category view instead of tree view
    #[arg(short, long)]
    pub categories: bool,

    /// Directory whose subdirectories become categories
    #[arg(short, long, value_name = "DIR", default_value = "img")]
    pub base_dir: PathBuf,

    /// Fallback image, created (solid gray) if missing
    #[arg(long, value_name = "FILE", default_value = "img/ikigai.jpeg")]
    pub default_image: PathBuf,

    /// Working directory of the companion app
    #[arg(long, value_name = "DIR", default_value = "RelaxationTube")]
    pub companion_dir: PathBuf,

    /// Companion command line
    #[arg(long, value_name = "CMD", num_args = 1.., default_values = ["php", "yii", "serve"])]
    pub companion_cmd: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_fixed_layout() {
        let cli = Cli::try_parse_from(["ibrowse"]).unwrap();
        assert_eq!(cli.root, PathBuf::from("."));
        assert!(!cli.categories);
        assert_eq!(cli.base_dir, PathBuf::from("img"));
        assert_eq!(cli.default_image, PathBuf::from("img/ikigai.jpeg"));
        assert_eq!(cli.companion_dir, PathBuf::from("RelaxationTube"));
        assert_eq!(cli.companion_cmd, ["php", "yii", "serve"]);
    }

    #[test]
    fn companion_command_takes_several_words() {
        let cli = Cli::try_parse_from([
            "ibrowse", "/data", "-c", "--companion-cmd", "python3", "serve.py", "8080",
        ])
        .unwrap();
        assert!(cli.categories);
        assert_eq!(cli.companion_cmd, ["python3", "serve.py", "8080"]);
        assert_eq!(cli.root, PathBuf::from("/data"));
    }
}
