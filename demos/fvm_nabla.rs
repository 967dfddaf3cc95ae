use std::f64::consts::PI;
use clap::Parser;
use log::{info, LevelFilter};
use ustencil::execution::Execution;
use ustencil::field::Field;
use ustencil::location::Location;
use ustencil::nabla::{nabla, NablaFields, SignSource};
use ustencil::structured::{CartesianMesh, DualGeometry};




#[derive(Parser)]
#[clap(version = "1.0", author = "J. Zrake <jzrake@clemson.edu>")]
struct Opts {
    /// Number of cells along each side of the periodic unit square
    #[clap(short = 'n', long, default_value = "64")]
    size: usize,

    /// Number of vertical levels
    #[clap(short = 'k', long, default_value = "4")]
    levels: usize,

    /// Size of the thread pool for the parallel run (Rayon's default if absent)
    #[clap(short = 't', long)]
    threads: Option<usize>,

    /// Width of the vertex-to-edge table
    #[clap(short = 'm', long, default_value = "7")]
    max_neighbors: usize,

    #[clap(long, default_value = "info")]
    log_level: LevelFilter,

    /// File to write the CBOR summary to
    #[clap(short, long, default_value = "nabla.cbor")]
    output: String,
}




#[derive(serde::Serialize)]
struct Stats {
    min: f64,
    max: f64,
    mean: f64,
}

impl Stats {
    fn of(field: &Field<f64>) -> Self {
        let (min, max, sum, count) = field
            .iter()
            .fold((f64::MAX, f64::MIN, 0.0, 0), |(a, b, s, n), &x| (a.min(x), b.max(x), s + x, n + 1));
        Self { min, max, mean: sum / count.max(1) as f64 }
    }
}




/**
 * The summary written at the end of a run
 */
#[derive(serde::Serialize)]
struct Summary {
    size: usize,
    num_levels: usize,
    execution: Execution,
    seconds_sequential: f64,
    seconds_parallel: f64,
    max_deviation: f64,
    max_error: f64,
    stokes_residual: f64,
    pnabla_mxx: Stats,
    pnabla_myy: Stats,
}




/**
 * Output buffers for one run of the kernel
 */
struct Run {
    zavgs_mxx: Field<f64>,
    zavgs_myy: Field<f64>,
    pnabla_mxx: Field<f64>,
    pnabla_myy: Field<f64>,
}




// ============================================================================
impl Run {

    fn new(grid: &CartesianMesh, num_levels: usize) -> Self {
        Self {
            zavgs_mxx: Field::zeros(Location::Edge, grid.num_edges(), num_levels),
            zavgs_myy: Field::zeros(Location::Edge, grid.num_edges(), num_levels),
            pnabla_mxx: Field::zeros(Location::Vertex, grid.num_vertices(), num_levels),
            pnabla_myy: Field::zeros(Location::Vertex, grid.num_vertices(), num_levels),
        }
    }

    fn fields<'a>(&'a mut self, geometry: &'a DualGeometry, pp: &'a Field<f64>) -> NablaFields<'a> {
        NablaFields {
            s_mxx: geometry.s_mxx.as_view(),
            s_myy: geometry.s_myy.as_view(),
            zavgs_mxx: self.zavgs_mxx.as_view_mut(),
            zavgs_myy: self.zavgs_myy.as_view_mut(),
            pp: pp.as_view(),
            pnabla_mxx: self.pnabla_mxx.as_view_mut(),
            pnabla_myy: self.pnabla_myy.as_view_mut(),
            vol: geometry.vol.as_view(),
        }
    }
}




// ============================================================================
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::parse();
    simple_logger::SimpleLogger::new().with_level(opts.log_level).init()?;

    let n = opts.size;
    let dx = 1.0 / n as f64;
    let grid = CartesianMesh::periodic(n, n, (dx, dx));
    let mesh = grid.mesh(opts.max_neighbors)?;
    let geometry = grid.geometry();
    info!("{} grid of {} vertices, spacing {:?}",
        if grid.is_periodic() { "periodic" } else { "bounded" },
        grid.num_vertices(),
        grid.spacing());

    let pp = Field::from_function(Location::Vertex, grid.num_vertices(), opts.levels, |v, k| {
        let (x, y) = grid.vertex_position(v);
        (k + 1) as f64 * (2.0 * PI * x).sin() * (2.0 * PI * y).cos()
    });

    let execution = match opts.threads {
        Some(n) => Execution::with_threads(n),
        None => Execution::parallel(),
    };

    let mut sequential = Run::new(&grid, opts.levels);
    let start = std::time::Instant::now();
    nabla(&mesh, &mut sequential.fields(&geometry, &pp), &SignSource::Connectivity, &Execution::Sequential)?;
    let seconds_sequential = start.elapsed().as_secs_f64();
    info!("sequential kernel: {:.4}s", seconds_sequential);

    let mut parallel = Run::new(&grid, opts.levels);
    let start = std::time::Instant::now();
    nabla(&mesh, &mut parallel.fields(&geometry, &pp), &SignSource::Connectivity, &execution)?;
    let seconds_parallel = start.elapsed().as_secs_f64();
    info!("parallel kernel ({:?}): {:.4}s", execution, seconds_parallel);

    let max_deviation = sequential.pnabla_mxx
        .iter()
        .zip(parallel.pnabla_mxx.iter())
        .chain(sequential.pnabla_myy.iter().zip(parallel.pnabla_myy.iter()))
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max);

    let mut max_error: f64 = 0.0;
    let mut stokes_residual: f64 = 0.0;

    for v in 0..grid.num_vertices() {
        let (x, y) = grid.vertex_position(v);
        for k in 0..opts.levels {
            let exact = (k + 1) as f64 * 2.0 * PI * (2.0 * PI * x).cos() * (2.0 * PI * y).cos();
            max_error = max_error.max((sequential.pnabla_mxx.at(v, k) - exact).abs());
            stokes_residual += geometry.vol.at(v, 0) * sequential.pnabla_mxx.at(v, k);
        }
    }

    let summary = Summary {
        size: n,
        num_levels: opts.levels,
        execution,
        seconds_sequential,
        seconds_parallel,
        max_deviation,
        max_error,
        stokes_residual,
        pnabla_mxx: Stats::of(&sequential.pnabla_mxx),
        pnabla_myy: Stats::of(&sequential.pnabla_myy),
    };
    info!("pnabla_mxx min={:.6} max={:.6} mean={:.6}", summary.pnabla_mxx.min, summary.pnabla_mxx.max, summary.pnabla_mxx.mean);
    info!("pnabla_myy min={:.6} max={:.6} mean={:.6}", summary.pnabla_myy.min, summary.pnabla_myy.max, summary.pnabla_myy.mean);
    info!("max |sequential - parallel| = {:.3e}", max_deviation);
    info!("max error against the exact gradient = {:.3e}", max_error);
    info!("sum of vol * pnabla_mxx = {:.3e}", stokes_residual);

    let file = std::fs::File::create(&opts.output)?;
    let mut buffer = std::io::BufWriter::new(file);
    ciborium::ser::into_writer(&summary, &mut buffer)?;
    info!("wrote {}", opts.output);
    Ok(())
}
