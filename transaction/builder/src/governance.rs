// Copyright (c) 2019-2024 The Caracal Project

//! The deterministic governance ("Diardi") payout scheme.
//!
//! A height-keyed keypair, derivable by anyone, lets the whole network
//! verify that a coinbase's governance output pays the published address
//! for that height. Under the legacy regime (fork versions 2 through 12) a
//! quarter of the base reward is carved out to a table entry selected by
//! `height mod 16`; under rotating governance (version 13 up) every fourth
//! block must be mined by a governance address and uses the deterministic
//! key as its tx secret instead.

use crate::pow::ChainReader;
use alloc::vec::Vec;
use caracal_account_keys::{Network, PublicAddress};
use caracal_crypto_keys::{KeyError, Keypair, PublicKey};
use caracal_crypto_ring_signature::onetime_keys::{derive_public_key, generate_key_derivation};
use caracal_transaction_core::constants::{
    GOVERNANCE_BLOCK_CADENCE, LEGACY_GOVERNANCE_TABLE_SIZE,
};

/// The height-keyed deterministic keypair.
///
/// The height is laid out little-endian in the first 8 seed bytes, the
/// rest zero, then reduced and base-multiplied. The layout is
/// consensus-visible and must match bit for bit.
pub fn get_deterministic_keypair_from_height(height: u64) -> Keypair {
    let mut seed = [0u8; 32];
    seed[..8].copy_from_slice(&height.to_le_bytes());
    Keypair::from_seed(&seed)
}

/// The governance carve-out: a quarter of the base reward.
pub fn governance_reward(base_reward: u64) -> u64 {
    base_reward / 4
}

/// Derive the output key `address` would receive at `output_index` under
/// the given (deterministic) tx keypair.
pub fn get_deterministic_output_key(
    address: &PublicAddress,
    tx_keypair: &Keypair,
    output_index: u64,
) -> Result<PublicKey, KeyError> {
    let derivation = generate_key_derivation(address.view_public_key(), &tx_keypair.secret)?;
    derive_public_key(&derivation, output_index, address.spend_public_key())
}

fn parse_table(entries: &[(&str, &str)]) -> Vec<PublicAddress> {
    entries
        .iter()
        .map(|(spend, view)| {
            PublicAddress::from_hex(spend, view, false)
                .expect("should be unreachable, the table entries are fixed valid keys")
        })
        .collect()
}

/// The legacy (v1) governance table for `network`: 16 published addresses.
pub fn governance_addresses_v1(network: Network) -> Vec<PublicAddress> {
    match network {
        Network::Mainnet => parse_table(&V1_MAINNET),
        Network::Testnet => parse_table(&V1_TESTNET),
        Network::Stagenet => parse_table(&V1_STAGENET),
    }
}

/// The legacy governance payee for `height`.
///
/// `height mod 16 == 0` selects index 15, anything else index
/// `mod - 1`. The wrap to the last entry rather than the first is
/// long-standing network behavior and must be preserved.
pub fn governance_address_v1(height: u64, network: Network) -> PublicAddress {
    let table = governance_addresses_v1(network);
    let index = match height % LEGACY_GOVERNANCE_TABLE_SIZE {
        0 => (LEGACY_GOVERNANCE_TABLE_SIZE - 1) as usize,
        modulus => (modulus - 1) as usize,
    };
    table[index].clone()
}

/// The rotating (v2) governance roster for `network`.
pub fn governance_addresses_v2(network: Network) -> Vec<PublicAddress> {
    match network {
        Network::Mainnet => parse_table(&V2_MAINNET),
        Network::Testnet => parse_table(&V2_TESTNET),
        Network::Stagenet => parse_table(&V2_STAGENET),
    }
}

/// Whether `miner_address` is on the governance roster.
///
/// The match runs on the view public key alone, as the network has always
/// done; a view-key collision between a roster entry and a foreign address
/// would misclassify the miner. Tightening this to a full-address match
/// needs consensus review first.
pub fn is_governance_miner(miner_address: &PublicAddress, network: Network) -> bool {
    governance_addresses_v2(network)
        .iter()
        .any(|entry| entry.view_public_key() == miner_address.view_public_key())
}

/// Verify that `output_key` is the governance output `candidate` should
/// have received at `height` and `output_index`.
pub fn validate_governance_reward_key(
    height: u64,
    candidate: &PublicAddress,
    output_index: u64,
    output_key: &PublicKey,
) -> bool {
    let keypair = get_deterministic_keypair_from_height(height);
    match get_deterministic_output_key(candidate, &keypair, output_index) {
        Ok(expected) => expected == *output_key,
        Err(_) => false,
    }
}

/// Check that the most recent governance block's final coinbase output
/// paid `miner_address`, reading the chain at `current_height - 4`.
pub fn check_last_governance_miner<C: ChainReader + ?Sized>(
    chain: &C,
    miner_address: &PublicAddress,
) -> bool {
    let Some(last_governance_height) = chain
        .current_height()
        .checked_sub(GOVERNANCE_BLOCK_CADENCE)
    else {
        return false;
    };
    let Some((output_index, output_key)) = chain.last_coinbase_output(last_governance_height)
    else {
        return false;
    };
    validate_governance_reward_key(
        last_governance_height,
        miner_address,
        output_index,
        &output_key,
    )
}

// The published governance rosters. Address string codecs live
// outside this crate, so the tables carry the raw key pairs.
const V1_MAINNET: [(&str, &str); 16] = [
    ("1cadeb96189ae5675f61d67f38b2d82048bede3537b739d292e466169edb5d80",
     "32cfe66f5e7314757453bf4105fd37ada0c4883a6c3a8ddb6b96975287870a29"),
    ("bdb24922f1a8e10fda3e13cdcfad44992f43c9a7eca77a0d44d0cb777f6f15a1",
     "f8a06fdc66ee14cad4772f29629661f61134f13e894445ef9970cea7cf4a3414"),
    ("913b654a3648759d96adc1aed1ab9161aff78e78a6bc710f6631c88d83882b89",
     "9ea779ab0d3847f2724656dcaa57add697174d7df49b22f2769382a5dd895e9d"),
    ("488f409207f1f25b009684d7c47e2358e17c4676bc5c35fe10b7489a66c29f22",
     "4e252722317c7b24f3b19e8de5693c2ad8711d50a74c013769d95df7e1e50a83"),
    ("243323559b2594383905badc97d8eb18e15d7a612621a19d129b48228a214213",
     "c469f557ef26361d359a6bca7f86dab1f8d13a5f7b2b882904b05189c9be56e0"),
    ("a6f6fb45b4c4134f47ac54b81667b52f3c0e01d13cbe25ae95e6c184f7ca2f10",
     "6e4e7192551f91f5e5cf51f94ba8101c27d640168a68d37cca14e86142bfa684"),
    ("b96803b65d047f228c1c3549eb6f6138e793b3edab98ca2e1e93c134d41de2cf",
     "75ea86a58c404e3f46273e5524e8bd29f6c61c833c833fa6f14734a64bc41438"),
    ("23a45d82e04599968b00463604e4eac0d47120df1322f0fb87b2af6e068bcad2",
     "244e4dbc56e081e8cf7c76e449467a9b92f0214c589617622163bfb31792bf88"),
    ("5ecd7bd8985fce044d6294964a79852f5590d2bc75efae0e4eca79368caa58dd",
     "7eff9f6ec87fafb9e866b7c322946854a0862e1b88d1d682bdfbae2b898d4fd5"),
    ("8ed613f3c0c026fd04dafc32b6899e954ef01f3b1447ac5bca2eca9e61c5cd85",
     "6737fc50d8f117c40f38e7412465bb7ba8a127d88b548910ec98eb073330c431"),
    ("1d322be922e78ae73fa5b1a8c61e8019c9c29f0433a40e1ac3b147eea654c7ab",
     "07aecbd6096ee79767009491f7671def7edf6786243a6f0c8986a73c566dd07b"),
    ("7f5480ff52edfa21889399a0ec2d86f4c1a9d962f5c8b7e2af4676912116e81f",
     "9bdc08dc37a73c66ce1d1b96f4bf8cf2252b8923b66de639c7b802b02000802b"),
    ("58766570e4f72cba949254137c45199311fb65a1527eb0fb21e08433d6d85dc3",
     "4f0a444f38be85411f39f6eb1f91dfc1012bdc557509d3e79f142d06bd97a91e"),
    ("da0154be48d173a7ec034527239b0e9432205eb8b06d79e5c6d7c45b2ff06d04",
     "ef9868101bf1ef5eb90d551ae8c02d5a5594f81c4cc65ec84ecc08728b08fcbf"),
    ("5b8764d9ed423c7a6303c0f8a7d754be311d75e46d7a6c5b46aad5b694bad35d",
     "ce4f0bbf2597e2f075084bcd4458c33ef8032f9ab7e8e251535275101b6f7c0e"),
    ("cd837a25bfb072d51c5ef5c259ee5742bac5a03807149b05feec5c7afa081382",
     "a872873f345771ab1f28bb2330383a0f6990dcc214d4c195f6ead66988a35a4d"),
];

const V1_TESTNET: [(&str, &str); 16] = [
    ("0271b7796c3f0785ea93d4db35bbe79019cce2967aad7059e5a69b75696d24b6",
     "71128c635f12ed8790f9ecb7b13a6c3e57f349f319c9bd781f68821ef0158aa0"),
    ("bd70b1b5907ba1de57667f469f3e34da513844bfda0713bdc8c47ab17152a60e",
     "778768af8900e84301888ff3e3a8bd20f52ea2940a15abbb1f2b28bc971969f6"),
    ("775e84dfe9607b292d923612931f4e8cdc04c4edf401e42e4e214569836d43ca",
     "a4f1ee86850d866c4bbaaec8707d1091131261aac257990914a42d179cb8dc23"),
    ("5adb6fe32933be6183d07a6c1646f38611765f86822e8111dfdccd0225e36455",
     "97227fdee65a42018ed44be47b94a8e2277afeb6eac84744db9ee4d80520363c"),
    ("1a73462a1517869f1322239f700e99a3a21a0e54c8920f13b4977eb8f4a39ef2",
     "a7f21e4ec9b09ce42e0d85f5e98860c910eb29a0c0b1e1fe65b297334258c415"),
    ("1d1fa959b6b19e3561b24627735ea9a57b1581f97783cac3cc6844a89cedd222",
     "471290822f3aa3bff20fe93d98584b9e1c23a15dae6892032bac275f5cf5c548"),
    ("a71aba01f857f4d58a65ce0a0272bdfc4ee9a53c3d0d807cb8b4d1284bf8dd94",
     "2ab3b333db7a00b3a81ecd88d6b57f6439116ccb9bb9ba2cf25fdaddb79bfd9b"),
    ("1110e8d73b03757002cd1ebc95ecd60b1d2d2c37959011def3ef45b19b1ece2d",
     "a4d017d694b52ecb6c323fc55d0e3229d7e8ec69cb332d76f9f3dbbcf77799b5"),
    ("b5c25ad779b2a5595aedc4a2438c09c64e70666ac93e10751863072ca01fa4c6",
     "1cb7b9ca777a90410961d0725d993d27b6df144d27834d71ffbbdb33933ef517"),
    ("d5633765ca269c0ecee29d0870cdf3936138b7c5f6777129fc6f79c5e949451a",
     "e830208b3684ad379810d3c902bafe9b750f1f5b3a6c2def9f858146b24a5f8d"),
    ("c09533101bb3ac9eb48c2139e96f388b914670165704fd6f8a60589c0f324412",
     "5147de0f5d807947cbb64623ee44fcdf6065ff6bc75d879a6d17a7e766a2e569"),
    ("8beaea82f239bb5f3ed73fe5f7f8dc307753cfba6fdcd43c32cbe10d36735d21",
     "a0d8e30e8ddcc904cdd3db0b44e8332f13f5fb82b8d879b77922a5977fcda366"),
    ("dd6c61cb2a1188e293dc93552503c17e69de453e607434ac04921a8287e57578",
     "54ce80596d0d2b242147afbcd68dcfaaaf1324ba749512f8ecb70c2c61d70d01"),
    ("627ec84a03a5015675820a693c335b704a33051198e8bc13a87b4ebfca37ff8b",
     "7a8e00ee9f1426b0768859ca456a59a676179410d282f987e51bd2206e422f58"),
    ("b8f7a542692c40e5573345e531f0fbca224499838576d79bc45d7e59a9f8228c",
     "97b737705f5cedaabf595f4b7b24ed61aad7950a489e4bfcd8a1adc22360eec4"),
    ("0e60669b815281414975293822a793805f591a2cc07396c740102f44565a7a0f",
     "5047038107e11158debb48a9f755a2eba135b4f808a7bc2af6c36fa95ed6db2b"),
];

const V1_STAGENET: [(&str, &str); 16] = [
    ("4f62213e15f8ca17ebc9cb1df9ca9b005416f86118573e9523d6ea8852065b75",
     "859c4cc8401cebaa12061b29b23381b62c0f2e39eb801ab72175477dc2fc6c97"),
    ("db5715a939a497f85028dc36e03fc3ea8bbf8a0de3605bc2bdb4748ca693a404",
     "1369de57229c93c2afc81cf7a6a0ccc99817b58c9663dcc54650f5f68e7b8055"),
    ("2e41cb18728cf5ae4f7cdc897858957f8b4bd723982e8a42516c076bcd07928d",
     "e02ff7393800c11bbcf7b10990cca23a9dff026f99c941a7c20ebe594d355040"),
    ("c47d68d2bf116a1c821b2d08c2b7c221f588a181264b3b163b9382da542a06b2",
     "a2acd34c334b090f6856a5a408c7254bec80e0631be8ae698a83059b6c344007"),
    ("2e20ed404162aca88425ae6936caa9b4f3662b27e33efd02f869aac5c5a02025",
     "c386ac2452b90c2df8d94f4c9b390538d70a30cea0f641accf1644ad1de8cb74"),
    ("cd591e8a2ba5ddc690d0ec01d997c773a47484111aa38e1fbad2390e96cde573",
     "3d71bee76761718f7a98eb13bb217593315ae012bde95d9e9f66d7e49a416246"),
    ("2585352f7af5553547d367f47f49ec1ccd05fca8bf272b4b47c5ad2ef7aa4e0c",
     "2856773ff67d9e5a6436d31288b31cedd7882de134efe364d280ccfdb02c2532"),
    ("b4c2b3b3aae433df79b060fed668d300e20d2ce134fd3631f3f739971b738cbb",
     "58f50cfa020bd7db6de828f08cb37dd9a8bd0655dd734fcca89d3384cc00b227"),
    ("b369ebf3dbf6c0868c6e3aee892bf1e1a8ef4590781c17ee78476d936dabad6b",
     "b0370a994f2c6e2498d72cfac1d7cbf8d6c637acde85613aa431d9e215eee1f4"),
    ("e46ee38ff1c939d4a5ec52e0da1ca8a03ea13e36c9aa8362866cc70b242137af",
     "8210763915a55f999fcd94a6db3833724c906cc7bbdd6d1dcef1a73d354210fe"),
    ("a20b6b0ddc27f9337eeed53336b3490110facfcf5631f2325a7f82d16a75ca27",
     "49235f5e590ffce55434f00715b44ffe54960f3edc2fd3c8fa7f7b2a4e19e444"),
    ("1e18ced6be6b9cd4e46e6570d767815bce5938b150a39e406ff8ec7372ea324b",
     "e0da66ecf841a35605002d9fbc0d0d07b9f53ddc84d57ede0751c37f6f986316"),
    ("2ff9a522a57a939215691be2a77d6b43d7f18e5830323f52ac00af17ae8ab79e",
     "ca44e2c727f23adae448361fb844a6f30fdec236873eb9ade71d217b6509a8d3"),
    ("c599756c0c367758e79e416599c22dce8a9405c87444bd2e241c20c403e89be4",
     "fda7a2b82e40f127b95b8e36a8b620fd595eb9eb13f0848dd89488aee4ca8b18"),
    ("7c5ac85172fdceeb3184c366c9741984feba8af568d2f07a90a8b9156a0556d7",
     "18adde3374f2b167baa8ea6c60d3ce64f4152fb98c349edca96491e34c948c38"),
    ("e2e987b681734a60bf0729d10748b2321308c2db7419ca0004170ba0e3b11c16",
     "c703d1634a95b7c7c1ad18777ff91d2c58bdd7fc68970d830a162b6ffe145b4c"),
];

const V2_MAINNET: [(&str, &str); 35] = [
    ("da2b5cd0146b8d23d3607b17c74b764fb51185f4a9e003cbb9eae7c108c68899",
     "c7e14b02866f4670cab77d41bce08d4011a1a36e2c7acd9b9e70a147605b7de3"),
    ("38bb717cd95ffdbeb19df571a6dc3177ed100a7716bc0ae608380f4446df521b",
     "9e6ff589043ecc86fb2342718f6c5ef1bfb7463d30864b777b8ca1fdf80e1efb"),
    ("75223fdc8a12ac1e9f8cea110deb0946649eb9e33fddf8253ee6349932d56624",
     "c8ac7a4c03faeeec83b835b2dc5e3d350d2d9eaa9ece3deeb33f8e67d2cc2d1c"),
    ("740a93619e08e1d8c902be474f99c65396e27249e71fbc4cfde6734082301db7",
     "0ead6f63e81b3348b67ee6a426afaed01bbc986658c10146962a5d9bf34b23b3"),
    ("a94c574cd064c1ae07a355d4676293cfa4aa29e387f9d269d4c0b1d6a3851403",
     "23362e7386fcc6845a853ce4cbaf81b8633e96613098f427985c5deee7de6387"),
    ("dce1abcd82392e5ac4872d8f39a078cd44eddfc713eaad6449082a8c84d6dcb3",
     "feb1cb43da9cc40d0b32059ff853fd5f615dfec3cbdfb066454001fd40d2516e"),
    ("74b8d936d2071dddaa45b26a0781f61389f4675d5f4bf09dc6e260f187e6d8a7",
     "5d9aaa7a8896336ef8cd1c064488ba864e95ee65e751cef66fcedd1fb34fa824"),
    ("481b5109bb7d43e462bd209fcdd97bd0af3c18a079de777d62d1ebf75526a11d",
     "2a00d070ee55c12e9a25649b2a86a65a6fcfbcae5a528d6d9ff78f1bdb694010"),
    ("f1f786650fd1f0ea859f82f3d60d4f598d54484edc700e941c8e775b67edb41c",
     "88ea50f10b6065f8274e42f39cc9c968d3c894b536f095d003b57ce448bf455c"),
    ("ae4dea9e0f908fb623a49d00e55b961bcbfa32181192e0ad28a2c590f2919107",
     "e8b1094a70664b6fbbd63bf9fd11d89509043a749bb58294bafe7ba6b4d16a94"),
    ("0f6fb61d2bff01abf3ed8d9a1e15f732cbfe26cb67eea51addf3f94c8c1a14a3",
     "b53cae6e65d6532d25498d48f9e4c3f0a665f42953c6c4d4e507496077a46b60"),
    ("4a947f48d6ffe8c9cad96993393e332322061bc88b477caabe8fda3be436c928",
     "d468e3d2321c029177cbcb8ede3c1df4474921337d0381bd3527618c54ba2f05"),
    ("9c89600df15495ba1368fed1b4ec15fac5a1e6d5b727dbfc438155f548f76eae",
     "a3ee479874921be500ca15fcd0ebf7689da349e3ee12fe1ea6d146e77afa3a1e"),
    ("58c7f8de258ef4518a8d3e6b0bd97b77006fa366fac92314bc12e5f148c9ab15",
     "38ddba03b3d99c7ba28eded9fe06b8f63f229278949a84fc0f57a6090e004f5a"),
    ("d8e93b92ba819df43e0726746883d21145ccdf2da8d4a10c67a885363e51ee9e",
     "14aed4730cb0578fcba0aebc5c009e30e51222762aad387e46988502626bc589"),
    ("5679603402337a0d166db26127bf6c2f68f23cac2d585c72e7e5ce06861bd419",
     "753e16b0aaf0160c84103958263eb078e37ec507477b74b42a22dffea4bb01e9"),
    ("c9bd64ab445e85d40c377d988bfee5ac25db518e5b65b9edcae2e53f2c74fff7",
     "d3e6444cb1bfa6621ffcd1777084a51b5d239e3888910461a7a62484ed9f10bc"),
    ("91a211ff25544b4a1be7e36106a1c3fd0bcbc88ebc1f0b28b6554e8306b11575",
     "3fe43bfe78ea8e815a203b01a3e32cf8d2df32a4ccbee9031f05f140962339b3"),
    ("620c410ff0b65033c774f8652b0006bf7f3adbb75cb4ea793543a448fcf56c92",
     "c66ab52b867bc9bb8f6a86d99e20751662f0bab33ac397cc3469dadf771106f1"),
    ("c5ebdadd15e1418bddd3012e7e82e53fc7cb26ba109e91be60e012cb029b5232",
     "6bf7f2c7b920c7d7bdf2b7e6dcbe9ae4d55959f1a3682de3e09cedc8d1334462"),
    ("5aec8883bb0e79097b866e29fedc8a421774f195966424103290c2d308438063",
     "802e73af032b97d8bd2ffbe75950b6b1c4575e8937f85db7916aec7fbb208f98"),
    ("92de07add320e02e278e08afb5b6f1e2ef2bfa01249188eb5a9c107c51b94395",
     "d852de5266d3a8bd0e01103d0c53aff1e6fe006bb82244d5125ca09d8d0788c9"),
    ("4bac171b7140f15ed95653a846b2c7f0300ecb495db6259435b3ce416e592df6",
     "a5535b1935f8c50e647093e29fad31b924061abef82c69fba6629b50b2f48c4a"),
    ("8fb151ede92ed12baab5db7268390d61a8d7e399dd7cac86b427be17264fc960",
     "6a82be95fa1a5e9fc8163f9dbf6396f8cf3fe7fc78bc5308a3c2bdedad72afdb"),
    ("eb1e1b52646220dee7162fe4475f44310e12bbb24ec4ea5ae83ea2fef706c950",
     "edbdb28ca85b0bc93aa715f96207b9d2fbc7f0c9565e08bf4263a5a984df78be"),
    ("0c0663d50b233a1ffd016463138dcb653d5a6d2048e4e207a73a666f2fba67c0",
     "03b129160217166daf8bcfc523d722fb74266c7e7c4f31ca9cea00f73e0b3a78"),
    ("eab244b9ded267e4451f3e62ee2837c3b823368d3decb231202661169c0c7ae3",
     "c0786d76cc75c26eee753b1fa92914a127bbb513280e98bcf764a0ea24a52014"),
    ("e9dda7062afbfd73eb1d3d577e34f57d2abcfb30ae50a442cb8e5ddb589769ee",
     "794d00b46b58c36facfd1c174fdfa123849601fb947506cb31c020ef630522c5"),
    ("d6cce88cb224e078d49ee02c368da59589e57f2b66cb1a57be4a27e5cc90936a",
     "b76c65d42f96517086c4b30a76b3bf751b8f77477431469a247ae309e537f6b4"),
    ("6f41a47e41b537bf313c12570bcae8e92509897183cc97b69d8fc0723cf033f6",
     "b4e0d2906a4f4b5f6a67d17bb27849214245efc8ca7e02bbb8e612cdfec638cb"),
    ("68bcb9a369a3755a48e1b26b81bc00766379147c4d1f469f2dbdc075b1e24871",
     "ae369d36de0006b13f9e265802ce7488b2fce9db577f30e42e80ef9cc180d9a0"),
    ("e6c14fa764d15b152a12517ca04dbf484ff72d31da9ee772b02103c728465b1f",
     "012699b7a5db05a4bce13921b175f9df64b6693416c00a22fcae9ba54ce403a7"),
    ("4cb153ef3a668c5cca80e9e230124904faff3746913bdd1aff4f1ea0b7090716",
     "a93c166b9d4ff2e1d95d126ef213667ae7d7f6fa98ccfbd1ca5b10a4b85d044f"),
    ("3c50446d78aaa00012de7d1ad19e48f8d73383c0f03edf44edecb0a2f5ff28a7",
     "1913d8bf472b0488a60fcc1315ee8c42f931fd7d968cf3f7b1766687e1a23957"),
    ("6d0a93238b2498b26a32c18c58339165d1a795fbdefe20e09ae4f03e489a8a9e",
     "007f81086453c59ccdc63fdc72a91afe22823e8ee2286c52d5a40d22361638c9"),
];

const V2_TESTNET: [(&str, &str); 35] = [
    ("d97ec8ed97521d365edb68bf4b3ca842ca6e14167dc2c77fed47c42499038b6d",
     "fa5bf18e0676e66436aebeb6c06beb9f82b162d8d5d33cc7b6fdef7f04896ec8"),
    ("68036dc88172955b8d91297d29bb2d77e8fd2392cd3ffbd6f3af57471a74d4d8",
     "f3f3a4062514460b4e67a270d1cbfb21b2201499e9530b6714debb2fdeb2eaba"),
    ("e7bc4fa4dd5930c999ab144831cdd2f94f44ce70ed6ae4f3397de736123158c4",
     "1b9a8248cba5b38132e78e4f6b2756814733aaa25a3bd06b0146ee881ee86556"),
    ("c72bb2d7f2f8007583cef174464dd0ad3179a91a3623680ce934152d2d25258c",
     "96462f38d0fa6ecc65f7c4a711f3d4992dd501e1840337404ca580d7e7710816"),
    ("c335718c2a76b0b3e6f1de9a6a089e186fe9c055062fda40bd099474f642a9e8",
     "aadf7edc1f2dcb058edcca5647c0eea62f0ebddecdaf7ce801856d2e45675a1d"),
    ("4a8ecf7bf729f017e3a399c91768bae8e5d771524ae4d0fb72bea433132f5757",
     "8f1625fc54318c8323837ca9c6888419b4a962eeaf0e06c07dff376cf2be263f"),
    ("3c86a3a2dfa79fbe588eed0e4e473e813ae4d8c122664ef55516964044d6c264",
     "90a8f8ae846fd2511ccffb2955a75d330511d456c7f02dc58471da7a6949ed68"),
    ("3d9a802040a9a66bc30defb4e0007457867af7985adaa07d9c8f0765c1845d04",
     "b864c7681813fbb4c058d080de1b11ea0d7d5385a94ea0dd0b5518df87d6f78a"),
    ("aae3d43fe690df1f029536674e22a9a2e6e48cc4c1baf280df42e37c44c39cee",
     "97b6c45686ba4b8d4f7799ad90cc2817c474017b5de9d8402f3429ac8a2ae65c"),
    ("222f2de339d2d74e4f8ad9f00a5d1e73fbfbb9c99b4fe7353f83fd45dcd9b6d9",
     "120a32207cd4321467a014bdba6d2cd8c23031cbb3a1dd0c0e4a561be99b1553"),
    ("5c07251c77a877d0527cc4f966ceedff0e0e2eb09d53143ec5616effccba686e",
     "d600a0464c4d1b08a6943ae888855575e29edba9a97ae20fd569588c5cb3d67e"),
    ("9afbe686a095d03bc6e9554e647d7586b1f2953ad4e5f2946a27ccfc5321d6d3",
     "074e767fb815cad289a23d69e93ec6386fc134981cd89907063e9b1b8494cfc1"),
    ("e666515a5cd8f02d7e641f698fcdd76056f34046fdf246c485055b8e0016a46d",
     "4641edb1281cd4d73510933402c4f25fc417929cf6866e2b23dd095d3edc7573"),
    ("c26bdf66442ee837a355ad758bac3e3cf37f929628cb7de1bef055a1763d97e6",
     "4fa4b2f7c5e53846da492b5acd81ca87e88137aa9b242e80f9952351b6c0ceb0"),
    ("1efc5bff6cbbb4715d91776f179baef9585648fcbaf4407f1fb287a930037251",
     "6c6311d77df7f47326213abf228306ceee4a4915f2673b75e85013e88b297d9e"),
    ("bd861d426ebfd586638445f795eefdf3ad5b4684ff29369ecbc8a15ffe149db5",
     "95869a5980bd1a4ba3773e13531e259585f2650ab715b8b46379cfc86eebe083"),
    ("2dbe5b4d52f7b484603d55cb1f06554f5d9c533c0f483234425c07d8dc608500",
     "3243563433d7ca496e753f0ea6011809db4bb1890bd80e304bc0f7150ddd4c61"),
    ("cfde893e9212f9b1888386f3e6262e6f3141461680e226b7fae1675035b208b8",
     "9083117f202f5bd4433e8a65f39e16b168d8ce9f09addf70a8390dd45b0b3f09"),
    ("c950192185b3757811884f5103442c0eda0c0a1a620ead6ebf3ee05f3d8bc06b",
     "cd2e47e81347f8a53612e1d6ce97aa23d99db9659a11bcad5842578f4b6c57e8"),
    ("adb7c3b517a57fb889fadb81e4575937cddc0f264e6025a24bf89ff22fde999f",
     "877a01ddecc370447411e8fe729b38e32aa815ae6f510506729599e0f8196483"),
    ("301d801b2b3f2ce05e97a76de643bea44193d684d3d79ace19f55da5a7d511c5",
     "fb1072cd91df6e2cbd914eda6885a29e5ef5ae8f8a9e1335b8eee62363ca0bd1"),
    ("0f16bbaceb973f6893b6247944f580255eec169b74db36de08807ff0e9691007",
     "4e6fbfc3d396bfd2f533d3e3a0757a18302d9b190cefb56f9c01ae23533fa85a"),
    ("6c9b31927a7eb3acbb28b424edc0b87346cdde8f45438205d6cbce4b4b76ac5b",
     "5011eea616855ec78692fc43afa784e754268984b05858ce1ad7976ca01f2c7c"),
    ("bb94644a30b78aa9e3582c790ad8be98e4859126875e03f7d6713d2012a2586c",
     "a91f0c688d5a853fc258a7979f35bd92cbc2be5a2ca67350628ead36c6e375e6"),
    ("32e09c2c0a801ca01c6f9e0094e95f1a3826c94012c676d35a2290d9f465b7d8",
     "0d85818c72c448b414e58d22ccd9fa738a1a85f1ef8d49de8715db96dcf344b2"),
    ("ed4043fb666cc90a8dd2d4feb3101a099933117c7674e0a1293e9c7cbfeaf710",
     "a8290319c8846c9e6cfaab9c1c89152f57a3ef6b5a388729456cdcddb93cb65a"),
    ("0ec55d7eb1ab93fb09bdd9bab01c4b6576a3d611c48d69cfde1c5bec6a21a4ec",
     "78d729a19dfeb759306a16612b9feef48a635cf4b644268be4e38f3cdaff1516"),
    ("863d08c30dde473c808d510f37929808316e15f5e0d94aa4263c66d7f6750b36",
     "6858b5a0e0e4ab6c29d13289832e7060fc74b32d2388fb405a3c10afc1e56b3d"),
    ("21abdc1174dcd0c9780dd883dd75b384ab9d80b783b5d5c195de32d920141ad1",
     "5697e08bdfafc3a520a45cdfa2a7290aa8e6a406728b44d84e866e648e4e4c93"),
    ("c8abc5f3d503d1254b1a192007f52df128b1c7d996d8a79fbdd8af862604eed8",
     "14b696f446840ba3b408b6fd0a748ce46767c26bb594e2f67c0f8aefb97647bc"),
    ("b9048eecb8d8210203e5f52f45c1e710ffc9c97022ca897d1386f1bf6f1f7188",
     "e6ca4b6ce3aeaf84b83dbccb8e94c86e8bd0920026e051e0cdc4afdce7509937"),
    ("158b70809eadce4e8ca4693f9ae9d6c15a76f21fe21b63941bb1874219025397",
     "09e03808161868f868c269770d40575fd0f04b8a0f5145cae857c9bf087564ff"),
    ("31b1e740efb940d9794ef6a60ed929212fe48d6be0d08146e9d32d2525008bc7",
     "172e8472206618ece5b5ccd9d432ae025b29afc7cf3b0bf7aec2c5de1a794cb1"),
    ("7e1190530117670062624fa810f38a02679542066235bbc223ef81c85390985c",
     "784c8f67894421438b5c17772e5bd4f8d9d0f5db8c624166457de5b8455a47e2"),
    ("713676da32d3e3be8d2f47ba715f4d86dcd609119b2a4651f96bfd6b427af3c4",
     "b4ba0f7b92c2410f3832b102de2fe8fbef5ac552a5c2647ca96b75cecd8b2664"),
];

const V2_STAGENET: [(&str, &str); 3] = [
    ("48b791f029eda4c761cbd2256ef29332e133d7ca2dfdc37bbb6b89e6c3d71483",
     "00599823e4145603d94063dab85240c60dbdd71831b8ceb71cee8ffb2ee86acd"),
    ("1c669df92c84057d1d2e5b8b910df469343bdd3ab824eb661517dad2e72eed20",
     "85b48077f5f749b4743b64c9322ee48b4adc944ec6db56879efc9a9eb2094e68"),
    ("cdd3773988a48e16fc22cb601ec0d73c569f2101dda93f0eacbdafa00049fdbe",
     "c6be094fbf61e596b68091125acb3e8a26e9d496d0c6c5d6d592c4c27ddc0fa4"),
];

#[cfg(test)]
mod tests {
    use super::*;
    use curve25519_dalek::edwards::EdwardsPoint;

    #[test]
    fn deterministic_keypair_is_height_keyed() {
        let a = get_deterministic_keypair_from_height(100);
        let b = get_deterministic_keypair_from_height(100);
        let c = get_deterministic_keypair_from_height(101);
        assert_eq!(a.public, b.public);
        assert_ne!(a.public, c.public);
        assert_eq!(
            a.public,
            PublicKey::from(EdwardsPoint::mul_base(a.secret.as_scalar()))
        );
    }

    #[test]
    fn seed_layout_is_little_endian_in_the_low_bytes() {
        // Heights below 2^52 stay below the group order, so the reduction
        // is the identity and the seed bytes survive into the scalar.
        let keypair = get_deterministic_keypair_from_height(0x0102030405060708);
        let bytes = keypair.secret.to_bytes();
        assert_eq!(&bytes[..8], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&bytes[8..], &[0u8; 24]);
    }

    #[test]
    fn tables_have_the_published_sizes() {
        for network in [Network::Mainnet, Network::Testnet, Network::Stagenet] {
            assert_eq!(governance_addresses_v1(network).len(), 16);
        }
        assert_eq!(governance_addresses_v2(Network::Mainnet).len(), 35);
        assert_eq!(governance_addresses_v2(Network::Testnet).len(), 35);
        assert_eq!(governance_addresses_v2(Network::Stagenet).len(), 3);
    }

    #[test]
    fn v1_index_rule_wraps_to_the_last_entry() {
        let table = governance_addresses_v1(Network::Mainnet);
        assert_eq!(governance_address_v1(32, Network::Mainnet), table[15]);
        assert_eq!(governance_address_v1(33, Network::Mainnet), table[0]);
        assert_eq!(governance_address_v1(47, Network::Mainnet), table[14]);
    }

    #[test]
    fn governance_reward_is_a_quarter() {
        assert_eq!(governance_reward(4_000), 1_000);
        assert_eq!(governance_reward(3), 0);
    }

    #[test]
    fn deterministic_output_key_validates() {
        let address = &governance_addresses_v1(Network::Mainnet)[3];
        let keypair = get_deterministic_keypair_from_height(500);
        let output_key = get_deterministic_output_key(address, &keypair, 1).unwrap();

        assert!(validate_governance_reward_key(500, address, 1, &output_key));
        assert!(!validate_governance_reward_key(501, address, 1, &output_key));
        assert!(!validate_governance_reward_key(500, address, 0, &output_key));
        let other = &governance_addresses_v1(Network::Mainnet)[4];
        assert!(!validate_governance_reward_key(500, other, 1, &output_key));
    }

    #[test]
    fn governance_miner_matches_on_view_key_only() {
        let roster = governance_addresses_v2(Network::Testnet);
        assert!(is_governance_miner(&roster[0], Network::Testnet));

        // Same view key under a different spend key still matches.
        let imposter = PublicAddress::new(
            *roster[1].spend_public_key(),
            *roster[0].view_public_key(),
        );
        assert!(is_governance_miner(&imposter, Network::Testnet));

        let stranger = PublicAddress::new(
            *roster[0].spend_public_key(),
            *roster[1].spend_public_key(),
        );
        assert!(!is_governance_miner(&stranger, Network::Testnet));
    }
}
