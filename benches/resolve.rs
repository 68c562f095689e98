//! Layout Resolution Benchmarks
//!
//! Measures relation-graph resolution over screens with many outputs
//! chained left to right.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use enumflags2::{BitFlag, BitFlags};
use randrkit::{
    BackendError, Connection, CrtcDescriptor, CrtcId, DisplayBackend, Mode, ModeId, OutputId,
    OutputInfo, RandrVersion, Reflection, Relation, Rotation, Screen, ScreenGeometry, Timestamp,
};

/// Backend serving a screen with `count` connected outputs and CRTCs.
struct SyntheticBackend {
    count: u64,
}

impl DisplayBackend for SyntheticBackend {
    fn query_version(&mut self) -> Result<RandrVersion, BackendError> {
        Ok(RandrVersion::new(1, 3))
    }

    fn list_modes(&mut self) -> Result<Vec<Mode>, BackendError> {
        Ok(vec![Mode {
            id: ModeId(1),
            name: "1920x1080".into(),
            width: 1920,
            height: 1080,
            dot_clock: 148_500_000,
            h_total: 2200,
            v_total: 1125,
        }])
    }

    fn list_crtcs(&mut self) -> Result<Vec<CrtcDescriptor>, BackendError> {
        Ok((0..self.count)
            .map(|i| CrtcDescriptor {
                id: CrtcId(i),
                x: 0,
                y: 0,
                width: 0,
                height: 0,
                mode: None,
                rotation: Rotation::Normal,
                reflection: Reflection::empty(),
                outputs: vec![],
                supported_rotations: BitFlags::all(),
                supported_reflections: BitFlags::all(),
                candidate_outputs: (0..self.count).map(OutputId).collect(),
            })
            .collect())
    }

    fn list_outputs(&mut self) -> Result<Vec<OutputInfo>, BackendError> {
        Ok((0..self.count)
            .map(|i| OutputInfo {
                id: OutputId(i),
                name: format!("DP-{i}"),
                mm_width: 520,
                mm_height: 290,
                connection: Connection::Connected,
                crtc: None,
                candidate_crtcs: (0..self.count).map(CrtcId).collect(),
                modes: vec![ModeId(1)],
                preferred_mode: 0,
                clones: vec![],
            })
            .collect())
    }

    fn screen_geometry(&mut self) -> Result<ScreenGeometry, BackendError> {
        Ok(ScreenGeometry {
            width: 0,
            height: 0,
            mm_width: 520,
            mm_height: 290,
            min_width: 320,
            min_height: 200,
            max_width: u32::MAX,
            max_height: u32::MAX,
        })
    }

    fn config_timestamp(&mut self) -> Result<Timestamp, BackendError> {
        Ok(Timestamp(0))
    }

    fn set_screen_size(&mut self, _: u32, _: u32, _: u32, _: u32) -> Result<(), BackendError> {
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn set_crtc_config(
        &mut self,
        _: CrtcId,
        _: Timestamp,
        _: i32,
        _: i32,
        _: ModeId,
        _: Rotation,
        _: BitFlags<Reflection>,
        _: &[OutputId],
    ) -> Result<(), BackendError> {
        Ok(())
    }

    fn disable_crtc(&mut self, _: CrtcId, _: Timestamp) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Screen with `count` outputs chained `DP-0 <- DP-1 <- ... <- DP-(n-1)`.
fn chained_screen(count: u64) -> Screen {
    let mut screen = Screen::load(Box::new(SyntheticBackend { count })).expect("load");
    for i in 0..count {
        let name = format!("DP-{i}");
        let output = screen.output_mut(&name).expect("output");
        output.set_mode(Some(ModeId(1)));
        if i > 0 {
            output.set_relation(Relation::RightOf, format!("DP-{}", i - 1));
        }
    }
    screen
}

fn bench_resolve_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_chain");

    for count in [2u64, 8, 32, 128] {
        let screen = chained_screen(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &screen, |b, screen| {
            b.iter(|| black_box(screen.resolve_layout()).expect("resolve"))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_resolve_chain);
criterion_main!(benches);
