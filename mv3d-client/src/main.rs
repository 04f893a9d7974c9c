use mv3d_core::{Result, clock::InstantClock, config::ViewerConfig, layout::VERTEX_LAYOUT, mesh};

use crate::{
    abs::{App, GpuGeometry},
    cli::Options,
    render::FrameController,
};

mod abs;
mod cli;
mod logging;
mod render;

fn main() {
    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}\n\n{}", cli::USAGE);
            std::process::exit(2);
        }
    };
    if options.help {
        println!("{}", cli::USAGE);
        return;
    }

    if let Err(e) = logging::init(logging::level(options.log_level)) {
        eprintln!("failed to install logger: {e}");
    }

    if let Err(e) = run(&options) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

/// Loads everything, then hands over to the frame loop.
///
/// Declaration order is the reverse of drop order: the controller (and with it the geometry and
/// program) is released before the window and its context.
fn run(options: &Options) -> Result<()> {
    let mut config = ViewerConfig::resolve(options.config.as_deref())?;
    options.apply(&mut config);
    log::debug!("Configuration: {}", config.to_json());

    // Load before opening a window; a bad file must never reach the renderer.
    let (mesh, report) = mesh::load(&config.mesh.path, &config.mesh.load_options())?;
    if !report.malformed.is_empty() {
        log::warn!(
            "{} of {} geometry records were malformed and skipped",
            report.malformed.len(),
            report.vertex_records + report.face_records + report.malformed.len()
        );
    }

    let mut app = App::new(&config.window)?;

    let program = render::build_program(&app.gl, &config.render)?;
    let geometry = GpuGeometry::upload(&app.gl, mesh, &program, &VERTEX_LAYOUT)?;
    log::debug!(
        "GPU buffers hold {} vertices in {} bytes and {} indices in {} bytes",
        geometry.vertex_count(),
        geometry.vertex_buffer_size(),
        geometry.index_count(),
        geometry.index_buffer_size()
    );

    let (width, height) = app.drawable_size();
    let camera = config.camera.camera(width, height);
    let mut controller = FrameController::new(
        &app.gl,
        program,
        geometry,
        camera,
        config.render.clone(),
        InstantClock::new(),
        app.context_thread,
    )?;
    controller.resize(width, height);

    render::run(&mut app, controller)?;

    log::info!("Bye!");
    Ok(())
}
