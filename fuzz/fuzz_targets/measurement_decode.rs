#![no_main]

use libfuzzer_sys::fuzz_target;
use sensorum::Measurement;

fuzz_target!(|data: &[u8]| {
    // Anything that decodes must re-encode and decode to the same value.
    if let Ok(measurement) = Measurement::decode(data) {
        let bytes = measurement.encode().expect("decoded measurement re-encodes");
        assert_eq!(Measurement::decode(&bytes), Ok(measurement));
    }
});
