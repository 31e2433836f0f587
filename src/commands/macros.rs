/// Builds the [Pid](super::Pid) table
///
/// Each row is `Variant("request", "response prefix", data bytes, "name", "unit") => formula`,
/// where the formula maps exactly `data bytes` decoded bytes (`A`, `B`, ...) to the value.
macro_rules! live_pids {
    {
        $(
            $(#[$attr:meta])*
            $variant:ident($request:literal, $prefix:literal, $len:literal, $name:literal, $unit:literal)
                => $formula:expr;
        )+
    } => {
        /// A Mode 01 (live data) PID with a known decode formula
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Pid {
            $(
                $(#[$attr])*
                ///
                #[doc=concat!(
                    "Details: request `", $request, "`, reply `", $prefix, "`, ",
                    stringify!($len), " data byte(s), unit `", $unit, "`"
                )]
                $variant,
            )+
        }

        impl Pid {
            /// Every PID in the table
            pub const ALL: &'static [Pid] = &[$(Pid::$variant),+];

            /// The request sent to the adapter, e.g. `"010C"`
            pub fn request_code(&self) -> &'static str {
                match self {
                    $(Pid::$variant => $request,)+
                }
            }

            /// The start of a positive reply, e.g. `"410C"`
            pub fn response_prefix(&self) -> &'static str {
                match self {
                    $(Pid::$variant => $prefix,)+
                }
            }

            /// Number of data bytes following the response prefix
            pub fn data_len(&self) -> usize {
                match self {
                    $(Pid::$variant => $len,)+
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(Pid::$variant => $name,)+
                }
            }

            pub fn unit(&self) -> &'static str {
                match self {
                    $(Pid::$variant => $unit,)+
                }
            }

            /// Apply the formula; `data` holds at least [data_len](Self::data_len) bytes
            pub(super) fn apply(&self, data: &[u8]) -> i32 {
                match self {
                    $(Pid::$variant => ($formula)(data),)+
                }
            }
        }
    };
}
