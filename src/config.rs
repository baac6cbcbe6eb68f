// Packer configuration
#[derive(Debug, Clone)]
pub struct Cfg {
    // Prefix put in front of every log line, e.g. "[hufpack] ..."
    pub log_prefix: String,

    // Level of the per-file summary line
    pub lvl: log::Level,

    // Capacity of the buffered writer wrapped around the output file
    pub buffer_size: usize,
}

impl Default for Cfg {
    fn default() -> Self {
        Cfg {
            log_prefix: "hufpack".to_string(),
            lvl: log::Level::Info,
            buffer_size: 64 * 1024,
        }
    }
}
