use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use usps_webtools::address::map_verify_result;
use usps_webtools::response::extract;
use usps_webtools::xml::parse_document;
use usps_webtools::{Api, ParseOptions};

const VERIFY_OK: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<AddressValidateResponse><Address ID="0"><Address1>APT 2</Address1><Address2>11205 SE 233RD PL</Address2><City>KENT</City><CityAbbreviation>KENT</CityAbbreviation><State>WA</State><Zip5>98031</Zip5><Zip4>6200</Zip4><DeliveryPoint>05</DeliveryPoint><CarrierRoute>C030</CarrierRoute><Footnotes>AN</Footnotes><DPVConfirmation>Y</DPVConfirmation><DPVCMRA>N</DPVCMRA><DPVFootnotes>AABB</DPVFootnotes><Business>N</Business><CentralDeliveryPoint>N</CentralDeliveryPoint><Vacant>N</Vacant></Address></AddressValidateResponse>"#;

// Parse, navigate and map a verify response under both parser shapes
pub fn mapping_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("verify_response_mapping");
    let path = Api::Verify.default_path();

    for explicit_array in [false, true] {
        let options = ParseOptions { explicit_array };
        group.bench_with_input(
            BenchmarkId::from_parameter(if explicit_array { "explicit_array" } else { "scalar" }),
            &options,
            |b, options| {
                b.iter(|| {
                    let document = parse_document(black_box(VERIFY_OK.as_bytes()), options).unwrap();
                    let element = extract(Api::Verify, &path, &document).unwrap();
                    black_box(map_verify_result(element).unwrap())
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, mapping_benchmark);
criterion_main!(benches);
