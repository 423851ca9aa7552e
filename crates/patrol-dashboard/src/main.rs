#![warn(clippy::all, rust_2018_idioms)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

// When compiling natively:
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    use clap::Parser;
    let args = patrol_dashboard::cli::Cli::parse();

    if let Err(e) = patrol_dashboard::tracing::init(&args) {
        eprintln!("Failed to start tracing: {e}");
    }

    let mut config = patrol_dashboard::configuration::get_configuration_or_default();
    if let Some(base_url) = args.base_url {
        config.backend.base_url = base_url;
    }
    tracing::info!(?config, "starting dashboard");

    let rt = match patrol_dashboard::background_worker::create_runtime() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(?e, "unable to create runtime");
            eprintln!("Unable to create runtime: {e}");
            std::process::exit(1);
        }
    };
    let _enter = rt.enter(); // This Guard must be held to call `tokio::spawn` anywhere in the program
    patrol_dashboard::background_worker::start_background_worker(rt); // This is also needed to prevent the runtime from stopping

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };
    eframe::run_native(
        "PatrolDashboard",
        native_options,
        Box::new(|cc| Ok(Box::new(patrol_dashboard::PatrolApp::new(cc, config)))),
    )
}

// When compiling to web using trunk
#[cfg(target_arch = "wasm32")]
fn main() {
    use eframe::wasm_bindgen::JsCast as _;

    // Redirect `log` message to `console.log` and friends:
    eframe::WebLogger::init(patrol_dashboard::wasm_log_level()).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let document = web_sys::window()
            .expect("No window found")
            .document()
            .expect("No document found (No DOM)");

        let canvas = document
            .get_element_by_id("the_canvas_id")
            .expect("Failed to find the_canvas_id")
            .dyn_into::<web_sys::HtmlCanvasElement>()
            .expect("the_canvas_id was not a HtmlCanvasElement");

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| {
                    Ok(Box::new(patrol_dashboard::PatrolApp::new(
                        cc,
                        patrol_dashboard::configuration::get_configuration_or_default(),
                    )))
                }),
            )
            .await;

        // Remove the loading text and spinner:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p> The app has crashed. See the developer console for details. </p>",
                    );
                    panic!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}
