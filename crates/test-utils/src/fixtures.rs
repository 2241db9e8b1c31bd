//! Common render targets for tests.

/// Request paths in `/width/height/re0/im0/re1/im1` form.
pub mod paths {
    /// The classic full view of the set
    pub const FULL_SET: &str = "/600/400/-2/-1/1/1";

    /// Tiny request that splits evenly into a 2x2 grid of 2x2 tiles
    pub const TINY_2X2: &str = "/4/4/-2/-1/1/1";

    /// Width and height that do not divide evenly by 3
    pub const UNEVEN: &str = "/31/20/-2/-1/1/1";

    /// Seahorse valley, a deep-ish zoom
    pub const SEAHORSE: &str = "/64/64/-0.7487/0.0997/-0.7387/0.1097";

    /// Paths that must be rejected with 404
    pub const MALFORMED: &[&str] = &[
        "/abc",
        "/4/4/-2/-1/1",
        "/4/4/-2/-1/1/1/9",
        "/0/4/-2/-1/1/1",
        "/4/4/a/-1/1/1",
        "/4.5/4/-2/-1/1/1",
    ];
}
