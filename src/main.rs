use std::process::ExitCode;

use clap::Parser;
use eframe::egui;

use diary_draw::app::DiaryDrawApp;
use diary_draw::cli::{self, CliArgs};
use diary_draw::session::DrawingSession;
use diary_draw::settings::DrawSettings;
use diary_draw::{log_err, log_info, logger};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let settings = DrawSettings::load();

    // -- headless mode ------------------------------------------------------
    if args.is_headless() {
        return cli::run(&args, &settings);
    }

    // -- GUI mode -----------------------------------------------------------

    // Session log (overwrites the previous one)
    if let Err(e) = logger::init() {
        eprintln!("warning: session log unavailable: {}", e);
    }

    let plan = args.plan(&settings);
    log_info!("Drawing for {} in {}", plan.date, plan.data_dir.display());

    let session = match DrawingSession::open_for_date(
        &plan.data_dir,
        plan.date,
        plan.width,
        plan.height,
        settings.tool_state(),
    ) {
        Ok(session) => session,
        Err(e) => {
            log_err!("Could not open drawing: {}", e);
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let (w, h) = (session.layers().width() as f32, session.layers().height() as f32);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            // room for the toolbar, status bar and layer list around the canvas
            .with_inner_size([w + 200.0, h + 110.0])
            .with_title("Drawing of the Day"),
        ..Default::default()
    };

    let date = plan.date;
    let result = eframe::run_native(
        "Diary Draw",
        options,
        Box::new(move |cc| Box::new(DiaryDrawApp::new(cc, session, date, settings))),
    );
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_err!("Window error: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
