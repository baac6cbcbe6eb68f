#![no_main]

use hufpack::pack::unpack;
use hufpack::{CodeTable, FrequencyTable, Packer, TreeBuilder};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let tree = TreeBuilder::build(&FrequencyTable::from_bytes(data)).unwrap();
    tree.verify().unwrap();
    let table = CodeTable::generate(&tree).unwrap();
    assert!(table.is_prefix_free());

    let mut packed = Vec::new();
    Packer::default().pack(data, &mut packed).unwrap();
    assert_eq!(unpack(&packed).unwrap(), data);

    // Arbitrary bytes fed to the reader must fail cleanly
    let _ = unpack(data);
});
