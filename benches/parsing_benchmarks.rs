use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kube_namespace_monitor::parsing::parse_df_output;
use kube_namespace_monitor::section::{encode_record, parse_section, SECTION_HEADER};
use kube_namespace_monitor::types::{DeploymentSummary, NamespaceRecord, PodSummary};

fn df_parsing_benchmark(c: &mut Criterion) {
    let outputs = vec![
        "Filesystem     1K-blocks    Used Available Use% Mounted on\n/dev/sdb 1998672 976004 953428 51% /data\n",
        "Filesystem 1K-blocks Used Available Use% Mounted on\noverlay 41152736 8124000 31141136 21% /\n/dev/sdc 10255636 10255636 0 100% /var/lib/data\n",
        "df: /missing: No such file or directory\n",
        "",
    ];

    c.bench_function("parse_df_output", |b| {
        b.iter(|| {
            for output in &outputs {
                black_box(parse_df_output(black_box(output)));
            }
        })
    });
}

fn section_parsing_benchmark(c: &mut Criterion) {
    let mut section = format!("{}\n", SECTION_HEADER);
    for n in 0..50 {
        let mut record = NamespaceRecord::new(format!("namespace-{}", n));
        for i in 0..20 {
            record.pods.insert(format!("pod-{}", i), PodSummary::default());
            record.deployments.insert(
                format!("deployment-{}", i),
                DeploymentSummary { replicas: 3, ready_replicas: 3, unavailable_replicas: 0 },
            );
        }
        if let Ok(line) = encode_record(&record) {
            section.push_str(&line);
            section.push('\n');
        }
    }

    c.bench_function("parse_section", |b| {
        b.iter(|| black_box(parse_section(black_box(&section))))
    });
}

criterion_group!(benches, df_parsing_benchmark, section_parsing_benchmark);
criterion_main!(benches);
