use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ustencil::execution::Execution;
use ustencil::field::Field;
use ustencil::location::Location;
use ustencil::nabla::{nabla, NablaFields, SignSource};
use ustencil::structured::CartesianMesh;




fn bench_nabla(c: &mut Criterion) {
    let mut group = c.benchmark_group("nabla");

    for &size in &[64usize, 256] {
        let grid = CartesianMesh::periodic(size, size, (1.0, 1.0));
        let mesh = grid.mesh(7).unwrap();
        let geometry = grid.geometry();
        let pp = Field::from_function(Location::Vertex, grid.num_vertices(), 4, |v, k| (v + k) as f64);
        let mut zavgs_mxx = Field::zeros(Location::Edge, grid.num_edges(), 4);
        let mut zavgs_myy = Field::zeros(Location::Edge, grid.num_edges(), 4);
        let mut pnabla_mxx = Field::zeros(Location::Vertex, grid.num_vertices(), 4);
        let mut pnabla_myy = Field::zeros(Location::Vertex, grid.num_vertices(), 4);

        for (name, execution) in [("sequential", Execution::Sequential), ("parallel", Execution::parallel())] {
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    let mut fields = NablaFields {
                        s_mxx: geometry.s_mxx.as_view(),
                        s_myy: geometry.s_myy.as_view(),
                        zavgs_mxx: zavgs_mxx.as_view_mut(),
                        zavgs_myy: zavgs_myy.as_view_mut(),
                        pp: pp.as_view(),
                        pnabla_mxx: pnabla_mxx.as_view_mut(),
                        pnabla_myy: pnabla_myy.as_view_mut(),
                        vol: geometry.vol.as_view(),
                    };
                    nabla(&mesh, &mut fields, &SignSource::Connectivity, &execution).unwrap();
                    black_box(fields.pnabla_mxx.data()[0]);
                });
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_nabla);
criterion_main!(benches);
