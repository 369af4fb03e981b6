use std::sync::OnceLock;

use hex_literal::hex;

use randomx::{RandomXError, RandomXMode, RandomXVm};

const LOREM_INPUT: &[u8] = b"sed do eiusmod tempor incididunt ut labore et dolore magna aliqua\n";

const TEST_HASH: [u8; 32] =
    hex!("639183aae1bf4c9a35884cb46b09cad9175f04efd7684e7262a0ac1c2f0b4e3f");
const LOREM_HASH_KEY_000: [u8; 32] =
    hex!("c36d4ed4191e617309867ed66a443be4075014e2b061bcdaf9ce7b721d2b77a8");
const LOREM_HASH_KEY_001: [u8; 32] =
    hex!("e9ff4503201c0c2cca26d285c93ae883f9b1d30c9eb240b820756f2d5a7905fc");

/// One shared light VM for `"test key 000"`, reused so the 256 MiB cache
/// is only built once per test binary.
fn light_vm() -> &'static RandomXVm {
    static VM: OnceLock<RandomXVm> = OnceLock::new();
    VM.get_or_init(|| RandomXVm::new(b"test key 000", RandomXMode::Light).unwrap())
}

#[test]
fn official_vectors_key_000() {
    let vm = light_vm();
    assert_eq!(vm.hash(b"This is a test").unwrap(), TEST_HASH);
    assert_eq!(
        vm.hash(b"Lorem ipsum dolor sit amet").unwrap(),
        hex!("300a0adb47603dedb42228ccb2b211104f4da45af709cd7547cd049e9489c969")
    );
    assert_eq!(vm.hash(LOREM_INPUT).unwrap(), LOREM_HASH_KEY_000);
}

#[test]
fn official_vector_key_001() {
    let vm = RandomXVm::new(b"test key 001", RandomXMode::Light).unwrap();
    assert_eq!(vm.hash(LOREM_INPUT).unwrap(), LOREM_HASH_KEY_001);
}

#[test]
#[ignore = "allocates and expands the full ~2 GiB dataset"]
fn fast_mode_matches_light() {
    let vm = RandomXVm::new(b"test key 000", RandomXMode::Fast).unwrap();
    assert_eq!(vm.hash(b"This is a test").unwrap(), TEST_HASH);
}

#[test]
fn repeated_hashes_are_identical() {
    let vm = light_vm();
    assert_eq!(vm.hash(b"input").unwrap(), vm.hash(b"input").unwrap());
}

#[test]
fn concurrent_hashes_match_sequential() {
    let vm = light_vm();
    let inputs: [&[u8]; 4] = [b"This is a test", b"second", b"third", b""];
    let sequential: Vec<_> = inputs.iter().map(|input| vm.hash(input).unwrap()).collect();

    std::thread::scope(|scope| {
        let handles: Vec<_> = inputs
            .iter()
            .map(|input| scope.spawn(move || vm.hash(input).unwrap()))
            .collect();
        for (handle, expected) in handles.into_iter().zip(&sequential) {
            assert_eq!(handle.join().unwrap(), *expected);
        }
    });
}

#[test]
fn input_boundaries() {
    let vm = light_vm();
    let empty = vm.hash(b"").unwrap();
    let large = vm.hash(&vec![0x5A; 64 * 1024]).unwrap();
    assert_ne!(empty, large);
    assert_eq!(empty, vm.hash(b"").unwrap());
}

#[test]
fn key_length_boundaries() {
    assert!(matches!(
        RandomXVm::new(&[], RandomXMode::Light),
        Err(RandomXError::EmptyKey)
    ));

    let short = RandomXVm::new(&[0x42], RandomXMode::Light).unwrap();
    let long = RandomXVm::new(&[0x42; 60], RandomXMode::Light).unwrap();
    assert_ne!(
        short.hash(b"boundary").unwrap(),
        long.hash(b"boundary").unwrap()
    );
}

#[test]
fn rekey_swaps_to_the_new_key() {
    let vm = RandomXVm::new(b"test key 000", RandomXMode::Light).unwrap();
    assert_eq!(vm.hash(LOREM_INPUT).unwrap(), LOREM_HASH_KEY_000);

    vm.rekey(b"test key 001").unwrap();
    assert_eq!(vm.hash(LOREM_INPUT).unwrap(), LOREM_HASH_KEY_001);

    // Rekeying to the current key is a no-op.
    vm.rekey(b"test key 001").unwrap();
    assert_eq!(vm.hash(LOREM_INPUT).unwrap(), LOREM_HASH_KEY_001);

    vm.close();
    assert!(matches!(vm.hash(b"x"), Err(RandomXError::Closed)));
    assert!(matches!(
        vm.rekey(b"test key 000"),
        Err(RandomXError::Closed)
    ));
}
