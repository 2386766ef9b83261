use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use ts::{PatRef, PesHeader, PmtRef, ProgramMap, TS_PACKET_SIZE, TsPacketRef};

fn benchmark_parsers(c: &mut Criterion) {
    let mut group = c.benchmark_group("Parser Performance");

    let ts_data = create_ts_data();

    group.bench_function("Packet headers", |b| {
        b.iter(|| {
            for chunk in black_box(&ts_data).chunks_exact(TS_PACKET_SIZE) {
                let packet = TsPacketRef::parse(chunk).unwrap();
                black_box(packet.payload());
            }
        })
    });

    group.bench_function("PSI and PES headers", |b| {
        b.iter(|| {
            let mut map = ProgramMap::default();
            for chunk in black_box(&ts_data).chunks_exact(TS_PACKET_SIZE) {
                let packet = TsPacketRef::parse(chunk).unwrap();
                match packet.pid {
                    0x0000 => {
                        let pat = PatRef::parse(packet.psi_payload().unwrap()).unwrap();
                        black_box(ProgramMap::resolve_pmt_pid(&pat).unwrap());
                    }
                    0x1000 => {
                        let pmt = PmtRef::parse(packet.psi_payload().unwrap()).unwrap();
                        map = ProgramMap::from_pmt(&pmt).unwrap();
                    }
                    pid if packet.payload_unit_start_indicator && map.stream_type(pid).is_some() => {
                        black_box(PesHeader::parse(packet.payload().unwrap()).unwrap());
                    }
                    _ => {}
                }
            }
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_parsers);
criterion_main!(benches);

fn create_ts_data() -> Vec<u8> {
    let mut ts_data = Vec::new();

    let mut pat_packet = vec![0xFFu8; 188];
    pat_packet[..4].copy_from_slice(&[0x47, 0x40, 0x00, 0x10]);
    pat_packet[4] = 0x00; // Pointer field
    pat_packet[5..17].copy_from_slice(&[
        0x00, 0xB0, 0x0D, // table id, section length 13
        0x00, 0x01, 0xC1, 0x00, 0x00, // ts id, version, section numbers
        0x00, 0x01, 0xF0, 0x00, // program 1 -> PMT PID 0x1000
    ]);
    pat_packet[17..21].fill(0);

    let mut pmt_packet = vec![0xFFu8; 188];
    pmt_packet[..4].copy_from_slice(&[0x47, 0x50, 0x00, 0x10]);
    pmt_packet[4] = 0x00;
    pmt_packet[5..27].copy_from_slice(&[
        0x02, 0xB0, 0x17, // table id, section length 23
        0x00, 0x01, 0xC1, 0x00, 0x00, // program 1, version, section numbers
        0xE1, 0x00, 0xF0, 0x00, // PCR PID 0x100, no program info
        0x1B, 0xE1, 0x00, 0xF0, 0x00, // H.264 on 0x100
        0x0F, 0xE1, 0x01, 0xF0, 0x00, // ADTS on 0x101
    ]);
    pmt_packet[27..31].fill(0);

    ts_data.extend_from_slice(&pat_packet);
    ts_data.extend_from_slice(&pmt_packet);

    for i in 0..500u32 {
        for pid in [0x100u16, 0x101] {
            let mut packet = vec![0u8; 188];
            packet[0] = 0x47;
            packet[1] = 0x40 | (pid >> 8) as u8;
            packet[2] = pid as u8;
            packet[3] = 0x10 | (i % 16) as u8;
            packet[4..18].copy_from_slice(&[
                0x00, 0x00, 0x01, 0xE0, 0x00, 0x00, 0x84, 0x80, 0x05, 0x21, 0x00, 0x01, 0x00,
                0x01,
            ]);
            ts_data.extend_from_slice(&packet);
        }
    }

    ts_data
}
