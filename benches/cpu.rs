use criterion::{criterion_group, criterion_main, Criterion};
use rboy_dmg::cpu::Cpu;

fn benchmark_cpu_clock(c: &mut Criterion) {
    let mut cpu = Cpu::default();
    cpu.boot();

    // fill a chunk of WRAM with a tight NOP loop so the benchmark measures
    // raw fetch/decode/execute throughput rather than any particular ROM
    cpu.set_pc(0xc000);
    for addr in 0xc000..0xc100 {
        cpu.mmu.write(addr, 0x00); // NOP
    }
    cpu.mmu.write(0xc0ff, 0x18); // JR -2 (loops back to the NOP run)
    cpu.mmu.write(0xc100, 0xfe);

    c.bench_function("cpu_clock", |b| {
        b.iter(|| {
            for _ in 0..1_000_000 {
                cpu.clock();
            }
        })
    });
}

criterion_group!(benches, benchmark_cpu_clock);
criterion_main!(benches);
