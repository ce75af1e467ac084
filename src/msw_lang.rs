// Localized UI strings
// English and Chinese text for the status line, end-of-game messages and resize warning

#[derive(Clone, Debug)]
pub struct Assets {
    // Status block
    pub status_mines_fmt: &'static str, // " Mines: {} "
    pub status_hint: &'static str,
    pub status_debug_fmt: &'static str, // "TPS: {}, FPS: {}"

    // End of game
    pub win_message: &'static str,
    pub loss_message: &'static str,
    pub new_game_hint: &'static str,

    // Terminal size messages
    pub tsmsg_line1: &'static str,
    pub tsmsg_line2: &'static str, // "Minimum size required: {} x {}"
    pub tsmsg_title: &'static str,

    pub title: &'static str,
}

/// Returns English language assets
pub fn english_assets() -> Assets {
    Assets {
        status_mines_fmt: " Mines: {} ",
        status_hint: "L: open   R: flag   L+R: chord   F2: new   D: debug   Esc: exit ",
        status_debug_fmt: " TPS: {}, FPS: {} ",

        win_message: " Mines Cleared — You Win! ",
        loss_message: " Mine Exploded — You Lose! ",
        new_game_hint: " F2: New game ",

        tsmsg_line1: "Terminal layout too small",
        tsmsg_line2: "Minimum size required: {} x {}",
        tsmsg_title: "Resize needed",

        title: " Minesweeper ",
    }
}

/// Returns Chinese language assets
pub fn chinese_assets() -> Assets {
    Assets {
        status_mines_fmt: " 地雷：{} ",
        status_hint: "左键：翻开   右键：标记   双键：组合排雷   F2：新游戏   D：调试   Esc：退出 ",
        status_debug_fmt: " TPS：{}，FPS：{} ",

        win_message: " 地雷已清除 — 你赢了！ ",
        loss_message: " 地雷爆炸 — 你输了！ ",
        new_game_hint: " F2：新游戏 ",

        tsmsg_line1: "终端屏幕布局过小",
        tsmsg_line2: "最小需要尺寸：{} x {}",
        tsmsg_title: "需要调整大小",

        title: " 扫雷 ",
    }
}

/// Holds the current language code and active string assets
pub struct Lang {
    pub current_lang: String,
    pub assets: Assets,
}

impl Lang {
    /// Normalizes the code ("zh-CN" → "zh") and defaults to English
    pub fn new(lang_code: &str) -> Self {
        let code = if lang_code.to_lowercase().starts_with("zh") {
            "zh"
        } else {
            "en"
        };

        Lang {
            current_lang: code.to_string(),
            assets: if code == "zh" {
                chinese_assets()
            } else {
                english_assets()
            },
        }
    }

    /// Substitute `{}` placeholders in order
    pub fn fill(fmt: &str, args: &[&dyn std::fmt::Display]) -> String {
        let mut out = String::with_capacity(fmt.len());
        let mut parts = fmt.split("{}");
        if let Some(first) = parts.next() {
            out.push_str(first);
        }
        for (i, part) in parts.enumerate() {
            if let Some(arg) = args.get(i) {
                out.push_str(&arg.to_string());
            }
            out.push_str(part);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_codes_normalize() {
        assert_eq!(Lang::new("zh-CN").current_lang, "zh");
        assert_eq!(Lang::new("en_US").current_lang, "en");
        assert_eq!(Lang::new("fr").current_lang, "en");
    }

    #[test]
    fn fill_substitutes_in_order() {
        assert_eq!(
            Lang::fill("Minimum size required: {} x {}", &[&66, &28]),
            "Minimum size required: 66 x 28"
        );
        assert_eq!(Lang::fill(" Mines: {} ", &[&-3]), " Mines: -3 ");
        assert_eq!(Lang::fill("none", &[]), "none");
    }
}
