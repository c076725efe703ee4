//! 全函数性质：任意输入组合都得到形状一致、取值在 [0, 1] 内的张量对。

use std::io::Cursor;
use std::path::Path;

use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba};
use image_loader_node::image_loader::{ChangeSignature, ImageLoader, LoaderConfig, SourceInputs};
use proptest::prelude::*;

fn loader() -> ImageLoader {
    ImageLoader::local(LoaderConfig::default().with_input_dir(Path::new("/nonexistent-input")))
}

fn field() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("null".to_string())),
        Just(Some("   ".to_string())),
        Just(Some("invalid_base64".to_string())),
        Just(Some("data:text/plain;base64,SGVsbG8=".to_string())),
        Just(Some("data:image/png;base64,".to_string())),
        Just(Some("../../etc/passwd".to_string())),
        "[A-Za-z0-9+/=]{0,24}".prop_map(Some),
        any::<String>().prop_map(Some),
    ]
}

fn png_base64(width: u32, height: u32, pixel: [u8; 4]) -> String {
    let img = ImageBuffer::from_pixel(width, height, Rgba(pixel));
    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut cursor, ImageFormat::Png)
        .expect("failed to encode test image");
    general_purpose::STANDARD.encode(cursor.into_inner())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn any_inputs_yield_well_formed_pair(
        pasted in field(),
        filepath in field(),
        base64 in field(),
        upload in field(),
    ) {
        let inputs = SourceInputs { pasted, filepath, base64, upload };
        let loaded = loader().load(&inputs);

        let image_shape = loaded.image.shape();
        let mask_shape = loaded.mask.shape();
        prop_assert_eq!(image_shape[0], 1);
        prop_assert_eq!(image_shape[3], 3);
        prop_assert_eq!(mask_shape[0], 1);
        prop_assert_eq!(&image_shape[1..3], &mask_shape[1..3]);
        prop_assert!(loaded.image.iter().all(|v| (0.0..=1.0).contains(v)));
        prop_assert!(loaded.mask.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn arbitrary_bytes_never_escape_as_errors(bytes in proptest::collection::vec(any::<u8>(), 0..256)) {
        let inputs = SourceInputs::default().with_base64(general_purpose::STANDARD.encode(&bytes));
        let loaded = loader().load(&inputs);
        prop_assert_eq!(loaded.image.shape()[1], loaded.mask.shape()[1]);
        prop_assert_eq!(loaded.image.shape()[2], loaded.mask.shape()[2]);
    }

    #[test]
    fn decoded_pixels_stay_in_unit_range(
        width in 1u32..12,
        height in 1u32..12,
        pixel in any::<[u8; 4]>(),
    ) {
        let loaded = loader().load(&SourceInputs::default().with_pasted(png_base64(width, height, pixel)));

        prop_assert_eq!(loaded.dimensions(), (height as usize, width as usize));
        prop_assert!((loaded.mean_opacity() - pixel[3] as f32 / 255.0).abs() < 1e-4);
        prop_assert!(loaded.image.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn signature_is_stable_and_value_sensitive(
        a in "[a-z]{1,12}\\.png",
        b in "[a-z]{1,12}\\.png",
    ) {
        let first = ChangeSignature::of(&SourceInputs::default().with_filepath(a.clone()));
        let again = ChangeSignature::of(&SourceInputs::default().with_filepath(a.clone()));
        let other = ChangeSignature::of(&SourceInputs::default().with_filepath(b.clone()));

        prop_assert_eq!(&first, &again);
        if a != b {
            prop_assert_ne!(first, other);
        }
    }
}
