//! Registry of tracked zones.
//!
//! The order here is the upstream's published area-list order and defines how
//! zones are partitioned into ingestion batches. Codes follow the same order.

use serde::Serialize;

/// A named urban area polled for crowding telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Zone {
    /// Stable identifier, e.g. `POI014`.
    pub code: &'static str,
    /// Korean display name, sent verbatim as the upstream query key.
    pub name: &'static str,
}

impl Zone {
    pub const fn new(code: &'static str, name: &'static str) -> Self {
        Self { code, name }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.code)
    }
}

/// Every zone, in batch order.
pub static ZONES: &[Zone] = &[
    Zone::new("POI001", "강남 MICE 관광특구"),
    Zone::new("POI002", "동대문 관광특구"),
    Zone::new("POI003", "명동 관광특구"),
    Zone::new("POI004", "이태원 관광특구"),
    Zone::new("POI005", "잠실 관광특구"),
    Zone::new("POI006", "종로·청계 관광특구"),
    Zone::new("POI007", "홍대 관광특구"),
    Zone::new("POI008", "경복궁"),
    Zone::new("POI009", "광화문·덕수궁"),
    Zone::new("POI010", "보신각"),
    Zone::new("POI011", "서울 암사동 유적"),
    Zone::new("POI012", "창덕궁·종묘"),
    Zone::new("POI013", "가산디지털단지역"),
    Zone::new("POI014", "강남역"),
    Zone::new("POI015", "건대입구역"),
    Zone::new("POI016", "고덕역"),
    Zone::new("POI017", "고속터미널역"),
    Zone::new("POI018", "교대역"),
    Zone::new("POI019", "구로디지털단지역"),
    Zone::new("POI020", "구로역"),
    Zone::new("POI021", "군자역"),
    Zone::new("POI022", "남구로역"),
    Zone::new("POI023", "대림역"),
    Zone::new("POI024", "동대문역"),
    Zone::new("POI025", "뚝섬역"),
    Zone::new("POI026", "미아사거리역"),
    Zone::new("POI027", "발산역"),
    Zone::new("POI028", "북한산우이역"),
    Zone::new("POI029", "사당역"),
    Zone::new("POI030", "삼각지역"),
    Zone::new("POI031", "서울대입구역"),
    Zone::new("POI032", "서울식물원·마곡나루역"),
    Zone::new("POI033", "서울역"),
    Zone::new("POI034", "선릉역"),
    Zone::new("POI035", "성신여대입구역"),
    Zone::new("POI036", "수유역"),
    Zone::new("POI037", "신논현역·논현역"),
    Zone::new("POI038", "신도림역"),
    Zone::new("POI039", "신림역"),
    Zone::new("POI040", "신촌·이대역"),
    Zone::new("POI041", "양재역"),
    Zone::new("POI042", "역삼역"),
    Zone::new("POI043", "연신내역"),
    Zone::new("POI044", "오목교역·목동운동장"),
    Zone::new("POI045", "왕십리역"),
    Zone::new("POI046", "용산역"),
    Zone::new("POI047", "이태원역"),
    Zone::new("POI048", "장지역"),
    Zone::new("POI049", "장한평역"),
    Zone::new("POI050", "천호역"),
    Zone::new("POI051", "총신대입구(이수)역"),
    Zone::new("POI052", "충정로역"),
    Zone::new("POI053", "합정역"),
    Zone::new("POI054", "혜화역"),
    Zone::new("POI055", "홍대입구역(2호선)"),
    Zone::new("POI056", "회기역"),
    Zone::new("POI057", "4·19 카페거리"),
    Zone::new("POI058", "가락시장"),
    Zone::new("POI059", "가로수길"),
    Zone::new("POI060", "광장(전통)시장"),
    Zone::new("POI061", "김포공항"),
    Zone::new("POI062", "낙산공원·이화마을"),
    Zone::new("POI063", "노량진"),
    Zone::new("POI064", "덕수궁길·정동길"),
    Zone::new("POI065", "방배역 먹자골목"),
    Zone::new("POI066", "북촌한옥마을"),
    Zone::new("POI067", "서촌"),
    Zone::new("POI068", "성수카페거리"),
    Zone::new("POI069", "수유리 먹자골목"),
    Zone::new("POI070", "쌍문동 맛집거리"),
    Zone::new("POI071", "압구정로데오거리"),
    Zone::new("POI072", "여의도"),
    Zone::new("POI073", "연남동"),
    Zone::new("POI074", "영등포 타임스퀘어"),
    Zone::new("POI075", "외대앞"),
    Zone::new("POI076", "용리단길"),
    Zone::new("POI077", "이태원 앤틱가구거리"),
    Zone::new("POI078", "인사동"),
    Zone::new("POI079", "창동 신경제 중심지"),
    Zone::new("POI080", "청담동 명품거리"),
    Zone::new("POI081", "청량리 제기동 일대 전통시장"),
    Zone::new("POI082", "해방촌·경리단길"),
    Zone::new("POI083", "DDP(동대문디자인플라자)"),
    Zone::new("POI084", "DMC(디지털미디어시티)"),
    Zone::new("POI085", "강서한강공원"),
    Zone::new("POI086", "고척돔"),
    Zone::new("POI087", "광나루한강공원"),
    Zone::new("POI088", "광화문광장"),
    Zone::new("POI089", "국립중앙박물관·용산가족공원"),
    Zone::new("POI090", "난지한강공원"),
    Zone::new("POI091", "남산공원"),
    Zone::new("POI092", "노들섬"),
    Zone::new("POI093", "뚝섬한강공원"),
    Zone::new("POI094", "망원한강공원"),
    Zone::new("POI095", "반포한강공원"),
    Zone::new("POI096", "북서울꿈의숲"),
    Zone::new("POI097", "불광천"),
    Zone::new("POI098", "서리풀공원·몽마르뜨공원"),
    Zone::new("POI099", "서울광장"),
    Zone::new("POI100", "서울대공원"),
    Zone::new("POI101", "서울숲공원"),
    Zone::new("POI102", "아차산"),
    Zone::new("POI103", "양화한강공원"),
    Zone::new("POI104", "어린이대공원"),
    Zone::new("POI105", "여의도한강공원"),
    Zone::new("POI106", "월드컵공원"),
    Zone::new("POI107", "응봉산"),
    Zone::new("POI108", "이촌한강공원"),
    Zone::new("POI109", "잠실종합운동장"),
    Zone::new("POI110", "잠실한강공원"),
    Zone::new("POI111", "잠원한강공원"),
    Zone::new("POI112", "청계산"),
    Zone::new("POI113", "청와대"),
    Zone::new("POI114", "북창동 먹자골목"),
    Zone::new("POI115", "남대문시장"),
    Zone::new("POI116", "익선동"),
];

/// The full registry in deterministic order.
pub fn all() -> &'static [Zone] {
    ZONES
}

pub fn by_code(code: &str) -> Option<&'static Zone> {
    ZONES.iter().find(|z| z.code == code)
}
