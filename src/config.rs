use lazy_static::lazy_static;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;

/// 模擬器設定
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SimSetting {
    /// 每秒模擬幀數
    pub tps: u64,
    /// 示範執行的模擬時長（秒）
    pub run_seconds: f32,
    /// 技能槽數量
    pub max_slots: i32,
    /// 共用全域冷卻
    pub global_cooldown: f32,
    /// 技能目錄檔路徑
    pub catalog_path: String,
    /// 依實際時間節流幀迴圈（關閉時全速跑完）
    pub realtime: bool,
}

impl Default for SimSetting {
    fn default() -> Self {
        SimSetting {
            tps: 20,
            run_seconds: 12.0,
            max_slots: 6,
            global_cooldown: 0.5,
            catalog_path: "skills.json".to_string(),
            realtime: false,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
struct Setting {
    #[serde(default)]
    sim: SimSetting,
}

impl SimSetting {
    /// 讀取 TOML 設定檔
    pub fn load(file_path: &str) -> Result<Self, String> {
        let mut file =
            File::open(file_path).map_err(|e| format!("no such file {} exception:{}", file_path, e))?;
        let mut str_val = String::new();
        file.read_to_string(&mut str_val)
            .map_err(|e| format!("Error Reading SimSetting: {}", e))?;
        let setting: Setting =
            toml::from_str(&str_val).map_err(|e| format!("Error Parsing SimSetting: {}", e))?;
        Ok(setting.sim)
    }

    /// 設定檔缺失或壞損時退回預設值，屬設定層故障，不讓程式崩潰
    pub fn load_or_default(file_path: &str) -> Self {
        match Self::load(file_path) {
            Ok(setting) => setting,
            Err(e) => {
                warn!("{}，改用預設設定", e);
                SimSetting::default()
            }
        }
    }
}

lazy_static! {
    /// 行程啟動時讀取一次的模擬設定
    pub static ref SETTING: SimSetting = SimSetting::load_or_default("skillsim.toml");
}
