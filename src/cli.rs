// ============================================================================
// diary-draw CLI: pick the day to draw, or query/export it without a window
// ============================================================================
//
// Usage examples:
//   diary-draw                                   (today's drawing, GUI)
//   diary-draw --date 2024-03-07                 (that day's drawing, GUI)
//   diary-draw --date 2024-03-07 --status        (exit 0 if a drawing was saved)
//   diary-draw --date 2024-03-07 --flatten-to out.png
//
// --status and --flatten-to never open a window.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::io;
use crate::session::DrawingSession;
use crate::settings::DrawSettings;

/// Diary drawing canvas.
#[derive(Parser, Debug)]
#[command(name = "diary-draw", about = "Layered drawing canvas for a diary entry")]
pub struct CliArgs {
    /// Day to draw, as YYYY-MM-DD.  Defaults to today.
    #[arg(short, long, value_parser = parse_date, value_name = "YYYY-MM-DD")]
    pub date: Option<NaiveDate>,

    /// Directory holding the drawing_YYYY-MM-DD.png files.
    /// Overrides `data_dir` from the settings file.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Canvas width for a new drawing.
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height for a new drawing.
    #[arg(long)]
    pub height: Option<u32>,

    /// Report whether a drawing has been saved for the day and exit
    /// (status 0 if it exists, 1 otherwise).
    #[arg(long)]
    pub status: bool,

    /// Write the day's flattened drawing to FILE and exit.
    #[arg(long, value_name = "FILE")]
    pub flatten_to: Option<PathBuf>,
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", s, e))
}

/// Settings merged with command-line overrides.
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchPlan {
    pub date: NaiveDate,
    pub data_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl CliArgs {
    /// True when no window should be opened.
    pub fn is_headless(&self) -> bool {
        self.status || self.flatten_to.is_some()
    }

    pub fn plan(&self, settings: &DrawSettings) -> LaunchPlan {
        LaunchPlan {
            date: self.date.unwrap_or_else(|| Local::now().date_naive()),
            data_dir: self.data_dir.clone().unwrap_or_else(|| settings.resolved_data_dir()),
            width: self.width.unwrap_or(settings.canvas_width),
            height: self.height.unwrap_or(settings.canvas_height),
        }
    }
}

/// Headless entry point for `--status` and `--flatten-to`.
pub fn run(args: &CliArgs, settings: &DrawSettings) -> ExitCode {
    let plan = args.plan(settings);

    if args.status {
        let path = io::drawing_path_for_date(&plan.data_dir, plan.date);
        return if io::has_saved_drawing(&plan.data_dir, plan.date) {
            println!("{}: saved ({})", plan.date, path.display());
            ExitCode::SUCCESS
        } else {
            println!("{}: no drawing", plan.date);
            ExitCode::FAILURE
        };
    }

    let Some(out) = &args.flatten_to else { return ExitCode::SUCCESS };
    let session = match DrawingSession::open_for_date(
        &plan.data_dir,
        plan.date,
        plan.width,
        plan.height,
        settings.tool_state(),
    ) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match io::save_drawing(out, &session.layers().flatten()) {
        Ok(()) => {
            crate::log_info!("Exported {} to {}", plan.date, out.display());
            println!("{}", out.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            crate::log_err!("Export failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
